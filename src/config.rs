//! Run configuration for a scrape

use crate::networking::client::DEFAULT_BASE_URL;
use crate::networking::client::blocking::DEFAULT_USER_AGENT;
use crate::networking::{Endpoints, FeedOptions, LoginInfo, TokenStrategy};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "post_data.csv";

/// Everything a scraping run needs, passed explicitly instead of baked into the binary
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Class (network) to scrape
    pub network_id: String,
    pub login: LoginInfo,
    pub output: PathBuf,
    pub base_url: String,
    pub feed: FeedOptions,
    /// Keep an existing output file and skip ids it already holds
    pub resume: bool,
    /// End the run when the login is rejected instead of scraping with a bare session
    pub abort_on_auth_failure: bool,
    pub token_strategy: TokenStrategy,
    /// `None` keeps the HTTP client's default
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl ScrapeConfig {
    pub fn new(network_id: &str, login: LoginInfo) -> Self {
        Self {
            network_id: network_id.to_string(),
            login,
            output: PathBuf::from(DEFAULT_OUTPUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            feed: FeedOptions::default(),
            resume: false,
            abort_on_auth_failure: true,
            token_strategy: TokenStrategy::default(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.base_url)
    }
}
