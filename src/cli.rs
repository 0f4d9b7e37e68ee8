//! Command line interface

use crate::config::{DEFAULT_OUTPUT, ScrapeConfig};
use crate::dataset::prepare_dataset;
use crate::errors::ScrapeError;
use crate::networking::client::DEFAULT_BASE_URL;
use crate::networking::client::blocking::DEFAULT_USER_AGENT;
use crate::networking::feed::DEFAULT_PAGE_SIZE;
use crate::networking::{FeedOptions, LoginInfo, TokenStrategy, get_login_info};
use crate::pipeline::run_scrape;
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, error};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "piazza-harvest",
    version,
    about = "Scrape Piazza Q&A posts to CSV and prepare fine-tuning data"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and export every post of a class to CSV
    Scrape(ScrapeArgs),
    /// Build an input/output training CSV from a scraped post CSV
    Prepare(PrepareArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Class (network) id
    #[arg(long, env = "PIAZZA_NETWORK_ID")]
    pub network_id: String,

    #[arg(long, env = "PIAZZA_EMAIL", requires = "password", conflicts_with = "login_file")]
    pub email: Option<String>,

    #[arg(long, env = "PIAZZA_PASSWORD", hide_env_values = true, requires = "email")]
    pub password: Option<String>,

    /// File with the email on the first line and the password on the second
    #[arg(long)]
    pub login_file: Option<PathBuf>,

    #[arg(long, short, env = "PIAZZA_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    #[arg(long, env = "PIAZZA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Pause before each post fetch, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Posts per feed page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, conflicts_with = "whole_feed")]
    pub page_size: u32,

    /// Request the whole feed in a single call
    #[arg(long)]
    pub whole_feed: bool,

    /// Keep the existing output file and skip posts it already holds
    #[arg(long)]
    pub resume: bool,

    /// Keep scraping when the login is rejected
    #[arg(long)]
    pub continue_on_auth_failure: bool,

    #[arg(long, value_enum, default_value_t = TokenStrategy::Split)]
    pub token_strategy: TokenStrategy,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Scraped post CSV
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    pub input: PathBuf,

    #[arg(long, short, default_value = "acad_formatted.csv")]
    pub output: PathBuf,
}

impl ScrapeArgs {
    fn login(&self) -> Result<LoginInfo, ScrapeError> {
        if let Some(path) = &self.login_file {
            return get_login_info(&path.to_string_lossy());
        }
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(LoginInfo::new(email, password)),
            _ => Err(ScrapeError::LoginFileError(
                "provide --email and --password or --login-file".to_string(),
            )),
        }
    }

    pub fn into_config(self) -> Result<ScrapeConfig, ScrapeError> {
        let mut config = ScrapeConfig::new(&self.network_id, self.login()?);
        let feed = if self.whole_feed {
            FeedOptions::eager()
        } else {
            FeedOptions::paged(self.page_size)
        };
        config.feed = feed.with_delay(Duration::from_millis(self.delay_ms));
        config.output = self.output;
        config.base_url = self.base_url;
        config.resume = self.resume;
        config.abort_on_auth_failure = !self.continue_on_auth_failure;
        config.token_strategy = self.token_strategy;
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        config.user_agent = self.user_agent;
        Ok(config)
    }
}

/// Initialize the logger; `RUST_LOG` directives apply on top of the default level
pub fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a second init (e.g. from tests) keeps the first logger
    let _ = builder.try_init();
}

fn scrape(args: ScrapeArgs) -> Result<u8, ScrapeError> {
    let config = args.into_config()?;
    let summary = run_scrape(&config)?;
    summary.log();
    Ok(summary.exit_code())
}

/// Run the parsed command and map the result to a process exit code
pub fn run_command(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    let result = match cli.command {
        Command::Scrape(args) => scrape(args),
        Command::Prepare(args) => prepare_dataset(&args.input, &args.output).map(|_| 0),
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
