//! # piazza-harvest
//!
//! Scrapes the question and answer posts of a Piazza class into a CSV file, and turns that file
//! into `input`/`output` pairs for fine-tuning.
//!
//! - [`networking`] signs API calls, logs in and walks the feed
//! - [`extraction`] flattens posts into CSV records
//! - [`sink`] appends records to the output file
//! - [`dataset`] prepares training pairs from a scraped file
//! - [`pipeline`] ties a full run together

pub mod cli;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod extraction;
pub mod networking;
pub mod pipeline;
pub mod sink;
pub mod utils;

pub use config::ScrapeConfig;
pub use errors::ScrapeError;
pub use pipeline::{RunSummary, SkippedPost, harvest, run_scrape, scrape};
