//! Append-only CSV sink for post records
//!
//! The file is opened per row so a crash mid-run leaves every earlier row intact.

use crate::errors::ScrapeError;
use crate::extraction::PostRecord;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use log::debug;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 7] = [
    "Created Date",
    "Folders",
    "ID",
    "Subject",
    "Question",
    "Instructor Answers",
    "Student Answers",
];

const ID_COLUMN: usize = 2;

fn write_row<W: Write>(writer: W, row: &[impl AsRef<[u8]>]) -> Result<(), ScrapeError> {
    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(writer);
    csv.write_record(row)?;
    csv.flush()?;
    Ok(())
}

#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    ids: HashSet<u64>,
}

impl CsvSink {
    /// Create (or truncate) `path` and write the header row
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref().to_path_buf();
        write_row(File::create(&path)?, &CSV_HEADER[..])?;
        Ok(Self {
            path,
            ids: HashSet::new(),
        })
    }

    /// Reopen an existing output file, remembering the ids already written
    ///
    /// A missing or empty file is created with a header.
    pub fn resume(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        if !path.exists() || path.metadata()?.len() == 0 {
            return Self::create(path);
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let mut ids = HashSet::new();
        for row in reader.records() {
            let row = row?;
            if let Some(id) = row.get(ID_COLUMN).and_then(|id| id.trim().parse().ok()) {
                ids.insert(id);
            }
        }
        debug!("{} already holds {} posts", path.display(), ids.len());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a post with this id has been written
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Post numbers already in the file
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.ids.iter().copied()
    }

    /// Number of posts in the file
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append one record
    pub fn append(&mut self, record: &PostRecord) -> Result<(), ScrapeError> {
        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        write_row(file, &record.to_row()[..])?;
        self.ids.insert(record.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{NO_INSTRUCTOR_ANSWER, NO_STUDENT_ANSWER};
    use std::fs;

    fn record(id: u64) -> PostRecord {
        PostRecord {
            created: "2024-09-01T00:00:00Z".to_string(),
            folders: "cs101, midterm".to_string(),
            id,
            subject: format!("subject {id}"),
            question: "line one\nline \"two\"".to_string(),
            instructor_answers: NO_INSTRUCTOR_ANSWER.to_string(),
            student_answers: NO_STUDENT_ANSWER.to_string(),
        }
    }

    fn rows(path: &Path) -> Vec<csv::StringRecord> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn create_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        let sink = CsvSink::create(&path).unwrap();
        assert!(sink.is_empty());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Created Date,Folders,ID,Subject,Question,Instructor Answers,Student Answers\r\n"
        );
    }

    #[test]
    fn appended_rows_keep_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.append(&record(1)).unwrap();
        sink.append(&record(2)).unwrap();

        let rows = rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][1], "cs101, midterm");
        assert_eq!(&rows[1][4], "line one\nline \"two\"");
        assert_eq!(&rows[2][2], "2");
        assert!(sink.contains(2));
    }

    #[test]
    fn create_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        CsvSink::create(&path).unwrap().append(&record(1)).unwrap();
        let sink = CsvSink::create(&path).unwrap();
        assert!(!sink.contains(1));
        assert_eq!(rows(&path).len(), 1);
    }

    #[test]
    fn resume_across_two_runs_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");

        let mut first = CsvSink::resume(&path).unwrap();
        first.append(&record(101)).unwrap();
        first.append(&record(102)).unwrap();
        drop(first);

        let mut second = CsvSink::resume(&path).unwrap();
        assert_eq!(second.len(), 2);
        for id in [101, 102, 103] {
            if !second.contains(id) {
                second.append(&record(id)).unwrap();
            }
        }

        let rows = rows(&path);
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "Created Date");
        let ids: Vec<&str> = rows[1..].iter().map(|r| r.get(2).unwrap()).collect();
        assert_eq!(ids, ["101", "102", "103"]);
    }

    #[test]
    fn resume_of_empty_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        fs::write(&path, "").unwrap();
        CsvSink::resume(&path).unwrap();
        assert_eq!(rows(&path).len(), 1);
    }
}
