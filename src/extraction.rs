//! # Post extraction
//!
//! Deserializes the post structure returned by `content.get` and flattens it into the
//! one-row-per-post record written to CSV.
//!
//! ## Usage
//!
//! ```rust
//! use piazza_harvest::extraction::{Post, normalize};
//! let post: Post = serde_json::from_value(serde_json::json!({
//!     "id": "k1", "nr": 12, "created": "2024-09-01T10:00:00Z",
//!     "folders": ["hw1"],
//!     "history": [{"subject": "Late policy?", "content": "Can I submit late?"}],
//!     "children": []
//! })).unwrap();
//! let record = normalize(&post).unwrap();
//! assert_eq!(record.instructor_answers, "No instructor answer");
//! ```
use crate::errors::ScrapeError;
use scraper::Html;
use serde::Deserialize;

/// Rendered when a post has no instructor answer; the dataset stage keys on it
pub const NO_INSTRUCTOR_ANSWER: &str = "No instructor answer";
/// Rendered when a post has no student answer; the dataset stage keys on it
pub const NO_STUDENT_ANSWER: &str = "No student answer";

const FOLDER_SEPARATOR: &str = ", ";
const ANSWER_SEPARATOR: &str = "; ";

/// One revision of a post or answer, newest first
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Revision {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum ChildKind {
    #[serde(rename = "i_answer")]
    InstructorAnswer,
    #[serde(rename = "s_answer")]
    StudentAnswer,
    /// followups, notes and anything else
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Child {
    #[serde(rename = "type")]
    pub kind: ChildKind,
    #[serde(default)]
    pub history: Vec<Revision>,
}

/// A post as returned by `content.get`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub nr: u64,
    pub created: String,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub history: Vec<Revision>,
    #[serde(default)]
    pub children: Vec<Child>,
}

/// Flat CSV record for a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub created: String,
    pub folders: String,
    pub id: u64,
    pub subject: String,
    pub question: String,
    pub instructor_answers: String,
    pub student_answers: String,
}

impl PostRecord {
    /// Fields in CSV column order
    pub fn to_row(&self) -> [String; 7] {
        [
            self.created.clone(),
            self.folders.clone(),
            self.id.to_string(),
            self.subject.clone(),
            self.question.clone(),
            self.instructor_answers.clone(),
            self.student_answers.clone(),
        ]
    }
}

fn join_answers(post: &Post, kind: ChildKind, placeholder: &str) -> String {
    let answers: Vec<&str> = post
        .children
        .iter()
        .filter(|child| child.kind == kind)
        .filter_map(|child| child.history.first())
        .map(|revision| revision.content.as_str())
        .collect();
    if answers.is_empty() {
        placeholder.to_string()
    } else {
        answers.join(ANSWER_SEPARATOR)
    }
}

/// Flatten a post into a [`PostRecord`]
///
/// Subject and question come from the newest revision. A post without any revision is malformed.
pub fn normalize(post: &Post) -> Result<PostRecord, ScrapeError> {
    let latest = post.history.first().ok_or_else(|| {
        ScrapeError::MalformedPost(format!("post {} has no history", post.nr))
    })?;

    Ok(PostRecord {
        created: post.created.clone(),
        folders: post.folders.join(FOLDER_SEPARATOR),
        id: post.nr,
        subject: latest.subject.clone(),
        question: latest.content.clone(),
        instructor_answers: join_answers(post, ChildKind::InstructorAnswer, NO_INSTRUCTOR_ANSWER),
        student_answers: join_answers(post, ChildKind::StudentAnswer, NO_STUDENT_ANSWER),
    })
}

/// Text content of an HTML fragment, tags dropped and entities decoded
pub fn html_to_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
}
