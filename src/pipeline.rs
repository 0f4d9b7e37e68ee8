//! A complete scraping run: log in, walk the feed, write one CSV row per post

use crate::config::ScrapeConfig;
use crate::errors::ScrapeError;
use crate::extraction::normalize;
use crate::networking::{
    Outcome, PostFetch, Session, Transport, authenticate, create_client, iterate_posts,
};
use crate::sink::CsvSink;
use log::{debug, error, info, warn};

/// A post that did not make it into the CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPost {
    pub cid: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    /// Posts already present in a resumed output file
    pub already_present: usize,
    pub skipped: Vec<SkippedPost>,
}

impl RunSummary {
    /// 0 when every post was written, 2 when some were skipped
    pub fn exit_code(&self) -> u8 {
        if self.skipped.is_empty() { 0 } else { 2 }
    }

    pub fn log(&self) {
        info!(
            "{} posts written, {} already present, {} skipped",
            self.written,
            self.already_present,
            self.skipped.len()
        );
        for skipped in &self.skipped {
            warn!("skipped {}: {}", skipped.cid, skipped.reason);
        }
    }
}

/// Walk every post and append the ones not yet in `sink`
pub fn harvest<T: Transport>(
    session: &Session<T>,
    config: &ScrapeConfig,
    sink: &mut CsvSink,
) -> Result<RunSummary, ScrapeError> {
    let mut summary = RunSummary::default();
    let mut posts = iterate_posts(session, &config.network_id, config.feed.clone())
        .skip_numbers(sink.ids().collect::<Vec<_>>());
    for fetch in posts.by_ref() {
        let PostFetch { cid, outcome } = fetch?;
        let post = match outcome {
            Outcome::Found(post) => post,
            Outcome::Skipped(reason) => {
                warn!("ERROR post {} skipped", cid);
                summary.skipped.push(SkippedPost { cid, reason });
                continue;
            }
        };
        let record = match normalize(&post) {
            Ok(record) => record,
            Err(e) => {
                warn!("ERROR post {} skipped: {}", cid, e);
                summary.skipped.push(SkippedPost {
                    cid,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if sink.contains(record.id) {
            debug!("post {} already in {}", record.id, sink.path().display());
            summary.already_present += 1;
            continue;
        }
        sink.append(&record)?;
        summary.written += 1;
        info!("Processed post {}", record.id);
    }
    summary.already_present += posts.already_known();
    info!("All posts processed and saved to {}", sink.path().display());
    Ok(summary)
}

/// Authenticate `session`, open the sink and harvest
pub fn scrape<T: Transport>(
    session: &mut Session<T>,
    config: &ScrapeConfig,
) -> Result<RunSummary, ScrapeError> {
    let extractor = config.token_strategy.extractor();
    if !authenticate(session, &config.login, extractor.as_ref())? {
        if config.abort_on_auth_failure {
            error!("login rejected, aborting");
            return Err(ScrapeError::AuthFailed("login rejected".to_string()));
        }
        warn!("login rejected, continuing with the unauthenticated session");
    }

    let mut sink = if config.resume {
        CsvSink::resume(&config.output)?
    } else {
        CsvSink::create(&config.output)?
    };
    harvest(session, config, &mut sink)
}

/// Scrape over a real HTTP client
pub fn run_scrape(config: &ScrapeConfig) -> Result<RunSummary, ScrapeError> {
    let transport = create_client(&config.user_agent, config.timeout)?;
    let mut session = Session::new(transport, config.endpoints());
    scrape(&mut session, config)
}
