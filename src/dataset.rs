//! Turns the scraped post CSV into `input`/`output` training pairs

use crate::errors::ScrapeError;
use crate::extraction::{NO_INSTRUCTOR_ANSWER, html_to_text};
use crate::utils::safe_static_regex;
use crate::{define_regex, make_static};
use log::info;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

define_regex!(
    DISALLOWED_CHARS_REGEX,
    DISALLOWED_CHARS_REGEX_TEXT,
    r#"[^a-zA-Z0-9\s.,"'?]"#
);

/// A row of the scraped CSV, as written by [`crate::sink::CsvSink`]
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapedRow {
    #[serde(rename = "Subject", default)]
    pub subject: String,
    #[serde(rename = "Question", default)]
    pub question: String,
    #[serde(rename = "Instructor Answers", default)]
    pub instructor_answers: String,
    #[serde(rename = "Student Answers", default)]
    pub student_answers: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingExample {
    pub input: String,
    pub output: String,
}

/// Advisor prompt wrapped around a student question
pub fn format_input(subject: &str, question: &str) -> String {
    format!(
        "
You are a helpful academic advisor assistant that provides answers to questions about general academic advising topics.

You will receive input in the following format:

subject: subject line,
question: student question

Your response should be in the following format:

answer: advisor answer

Here is the input:

subject: {subject},
question: {question}

Provide your helpful response here:
"
    )
}

/// Drop markup, `#pin` tags and anything but letters, digits, whitespace and `.,"'?`
pub fn clean_text(text: &str) -> Result<String, ScrapeError> {
    let text = html_to_text(&text.replace("#pin", ""));
    let regex = safe_static_regex(DISALLOWED_CHARS_REGEX.clone(), DISALLOWED_CHARS_REGEX_TEXT)?;
    Ok(regex.replace_all(&text, "").into_owned())
}

fn strip_placeholder(value: &str, placeholder: &str) -> String {
    if value == placeholder {
        String::new()
    } else {
        value.to_string()
    }
}

/// Build a training example from a scraped row; `None` when either side ends up blank
///
/// Subject, question and answer are cleaned before they are placed in the prompt, so the
/// template's own `:` separators survive. The older pandas cleaner ran over the whole
/// formatted prompt and stripped them; files prepared here differ from its output there.
pub fn to_example(row: &ScrapedRow) -> Result<Option<TrainingExample>, ScrapeError> {
    // only instructor answers become training targets
    let answer = strip_placeholder(&row.instructor_answers, NO_INSTRUCTOR_ANSWER);

    let subject = clean_text(&row.subject)?;
    let question = clean_text(&row.question)?;
    let output = clean_text(&answer)?;
    if (subject.trim().is_empty() && question.trim().is_empty()) || output.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(TrainingExample {
        input: format_input(subject.trim(), question.trim()),
        output: output.trim().to_string(),
    }))
}

/// Clean every row in parallel, preserving order and dropping blank examples
pub fn prepare_examples(rows: &[ScrapedRow]) -> Result<Vec<TrainingExample>, ScrapeError> {
    let examples = rows
        .par_iter()
        .map(to_example)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(examples.into_iter().flatten().collect())
}

/// Read the scraped CSV at `input`, write `input,output` pairs to `output`
///
/// Prompts keep the template's `:` separators; see [`to_example`].
///
/// # Returns
/// * number of examples written
pub fn prepare_dataset(input: &Path, output: &Path) -> Result<usize, ScrapeError> {
    let mut reader = csv::Reader::from_path(input)?;
    let rows = reader
        .deserialize::<ScrapedRow>()
        .collect::<Result<Vec<_>, _>>()?;
    let examples = prepare_examples(&rows)?;

    let mut writer = csv::Writer::from_path(output)?;
    for example in &examples {
        writer.serialize(example)?;
    }
    writer.flush()?;

    info!(
        "Data wrangling complete: {} of {} posts saved to {}",
        examples.len(),
        rows.len(),
        output.display()
    );
    Ok(examples.len())
}
