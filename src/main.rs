//! piazza-harvest CLI
//!
//! # Usage
//!
//! ```bash
//! # Export every post of a class
//! PIAZZA_EMAIL=me@school.edu PIAZZA_PASSWORD=... piazza-harvest scrape --network-id m05fat1q3i87bn
//!
//! # Continue an interrupted export
//! piazza-harvest scrape --network-id m05fat1q3i87bn --login-file log.txt --resume
//!
//! # Build training pairs
//! piazza-harvest prepare --input post_data.csv --output acad_formatted.csv
//! ```

use clap::Parser;
use piazza_harvest::cli::{Cli, run_command};
use std::process::ExitCode;

fn main() -> ExitCode {
    run_command(Cli::parse())
}
