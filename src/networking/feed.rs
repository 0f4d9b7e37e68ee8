//! Feed listing, post fetch and the lazy post iterator

use crate::errors::ScrapeError;
use crate::extraction::Post;
use crate::networking::client::blocking::call;
use crate::networking::client::{ApiRequest, Outcome, Session, Transport, handle_error};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::thread::sleep;
use std::time::Duration;

/// Sort order requested from `network.get_my_feed`
pub const FEED_SORT: &str = "updated";
/// Limit used when the whole feed is requested at once
pub const UNBOUNDED_FEED_LIMIT: u32 = 999_999;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    /// Post number, when the feed lists it
    #[serde(default)]
    pub nr: Option<u64>,
}

/// One page of the feed
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Feed {
    #[serde(default)]
    pub feed: Vec<FeedEntry>,
}

/// Get a page of the network's feed
///
/// # Arguments
/// * `session` - authenticated session
/// * `network_id` - class to list
/// * `limit` - page size
/// * `offset` - entries to skip
pub fn get_feed<T: Transport>(
    session: &Session<T>,
    network_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Outcome<Feed>, ScrapeError> {
    let request = ApiRequest::new("network.get_my_feed")
        .network(network_id)
        .param("limit", limit)
        .param("offset", offset)
        .param("sort", FEED_SORT);
    let response = call(session, &request)?;
    match handle_error(response, "Could not get the feed") {
        Outcome::Found(result) => Ok(Outcome::Found(serde_json::from_value(result)?)),
        Outcome::Skipped(reason) => Ok(Outcome::Skipped(reason)),
    }
}

/// Get the full content of post `cid`
pub fn get_post<T: Transport>(
    session: &Session<T>,
    cid: &str,
    network_id: &str,
) -> Result<Outcome<Value>, ScrapeError> {
    let request = ApiRequest::new("content.get")
        .network(network_id)
        .param("cid", cid)
        .param("student_view", Value::Null);
    let response = call(session, &request)?;
    Ok(handle_error(response, &format!("Could not get post {cid}.")))
}

/// How [`iterate_posts`] walks the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// `None` fetches the whole feed in one request
    pub page_size: Option<u32>,
    /// Pause before each post fetch
    pub delay: Duration,
}

impl FeedOptions {
    pub fn paged(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size.max(1)),
            delay: Duration::ZERO,
        }
    }

    pub fn eager() -> Self {
        Self {
            page_size: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::paged(DEFAULT_PAGE_SIZE)
    }
}

/// A fetched post, or the reason it was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct PostFetch {
    pub cid: String,
    pub outcome: Outcome<Post>,
}

/// Lazy, sequential walk over every post in a network's feed
///
/// Feed pages are requested only when the previously listed posts have been fetched.
/// After an `Err` the iterator is exhausted.
pub struct PostIter<'a, T: Transport> {
    session: &'a Session<T>,
    network_id: String,
    options: FeedOptions,
    pending: VecDeque<String>,
    seen: HashSet<String>,
    known: HashSet<u64>,
    already_known: usize,
    offset: u32,
    feed_done: bool,
    finished: bool,
}

/// Iterate over all posts of `network_id` in feed order
pub fn iterate_posts<'a, T: Transport>(
    session: &'a Session<T>,
    network_id: &str,
    options: FeedOptions,
) -> PostIter<'a, T> {
    PostIter {
        session,
        network_id: network_id.to_string(),
        options,
        pending: VecDeque::new(),
        seen: HashSet::new(),
        known: HashSet::new(),
        already_known: 0,
        offset: 0,
        feed_done: false,
        finished: false,
    }
}

impl<T: Transport> PostIter<'_, T> {
    /// Leave out feed entries whose post number is in `numbers`; they are never fetched
    pub fn skip_numbers(mut self, numbers: impl IntoIterator<Item = u64>) -> Self {
        self.known.extend(numbers);
        self
    }

    /// Feed entries left out by [`PostIter::skip_numbers`] so far
    pub fn already_known(&self) -> usize {
        self.already_known
    }

    fn fill(&mut self) -> Result<(), ScrapeError> {
        while self.pending.is_empty() && !self.feed_done {
            let limit = self.options.page_size.unwrap_or(UNBOUNDED_FEED_LIMIT);
            let page = match get_feed(self.session, &self.network_id, limit, self.offset)? {
                Outcome::Found(page) => page,
                Outcome::Skipped(reason) => return Err(ScrapeError::FeedError(reason)),
            };
            let count = page.feed.len();
            debug!("feed page at offset {} listed {} posts", self.offset, count);
            self.offset = self.offset.saturating_add(count as u32);
            if self.options.page_size.is_none() || count < limit as usize {
                self.feed_done = true;
            }
            let mut fresh = 0;
            for entry in page.feed {
                if !self.seen.insert(entry.id.clone()) {
                    debug!("post {} listed twice, ignoring repeat", entry.id);
                    continue;
                }
                fresh += 1;
                if entry.nr.is_some_and(|nr| self.known.contains(&nr)) {
                    debug!("post {} already harvested, not fetching", entry.id);
                    self.already_known += 1;
                    continue;
                }
                self.pending.push_back(entry.id);
            }
            // a full page with nothing new means the server is not advancing
            if !self.feed_done && fresh == 0 {
                warn!(
                    "feed page at offset {} repeated earlier posts only, stopping pagination",
                    self.offset
                );
                self.feed_done = true;
            }
        }
        Ok(())
    }

    fn fetch(&self, cid: String) -> Result<PostFetch, ScrapeError> {
        if !self.options.delay.is_zero() {
            sleep(self.options.delay);
        }
        let outcome = match get_post(self.session, &cid, &self.network_id)? {
            Outcome::Found(value) => match serde_json::from_value::<Post>(value) {
                Ok(post) => Outcome::Found(post),
                Err(e) => {
                    warn!("Post {} is malformed: {}", cid, e);
                    Outcome::Skipped(format!("Malformed post {cid}: {e}"))
                }
            },
            Outcome::Skipped(reason) => Outcome::Skipped(reason),
        };
        Ok(PostFetch { cid, outcome })
    }
}

impl<T: Transport> Iterator for PostIter<'_, T> {
    type Item = Result<PostFetch, ScrapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Err(e) = self.fill() {
            self.finished = true;
            return Some(Err(e));
        }
        let Some(cid) = self.pending.pop_front() else {
            self.finished = true;
            return None;
        };
        let fetched = self.fetch(cid);
        if fetched.is_err() {
            self.finished = true;
        }
        Some(fetched)
    }
}
