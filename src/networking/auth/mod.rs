//! Credentials and CSRF token extraction

pub mod blocking;

use crate::errors::ScrapeError;
use crate::utils::safe_static_regex;
use crate::{define_regex, make_static};
use regex::Regex;
use std::fmt;
use std::fs;
use std::sync::LazyLock;

define_regex!(
    CSRF_TOKEN_REGEX,
    CSRF_TOKEN_REGEX_TEXT,
    r#"(?i)CSRF_TOKEN\s*=\s*["']?([^"';\s]+)"#
);

/// Login information for Piazza authentication
#[derive(Clone)]
pub struct LoginInfo {
    pub email: Box<str>,
    pub password: Box<str>,
}

impl LoginInfo {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInfo")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Get login information from text file at provided path
///
/// # Arguments
/// * `path` - Path to login file (email on first line, password on second)
///
/// # Example
/// ```no_run
/// use piazza_harvest::networking::get_login_info;
/// let info = get_login_info("log.txt").unwrap();
/// ```
pub fn get_login_info(path: &str) -> Result<LoginInfo, ScrapeError> {
    let file = fs::read_to_string(path)
        .map_err(|e| ScrapeError::LoginFileError(format!("failed to read {path}: {e}")))?;
    let mut lines = file.lines().map(str::trim);
    let email = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ScrapeError::LoginFileError("Email not found".to_string()))?;
    let password = lines
        .next()
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ScrapeError::LoginFileError("Password not found".to_string()))?;
    Ok(LoginInfo::new(email, password))
}

/// Pulls the CSRF token out of the token page body
pub trait TokenExtractor {
    fn extract(&self, body: &str) -> Option<String>;
}

/// Strips `"` and `;`, splits on `=` and keeps the second segment.
/// Tied to the exact `CSRF_TOKEN = "..."` markup of the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitTokenExtractor;

impl TokenExtractor for SplitTokenExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        let stripped = body.replace(['"', ';'], "");
        stripped
            .split('=')
            .nth(1)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// Matches the `CSRF_TOKEN = value` assignment anywhere in the body
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternTokenExtractor;

impl TokenExtractor for PatternTokenExtractor {
    fn extract(&self, body: &str) -> Option<String> {
        let regex = safe_static_regex(CSRF_TOKEN_REGEX.clone(), CSRF_TOKEN_REGEX_TEXT).ok()?;
        regex
            .captures(body)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Which [`TokenExtractor`] a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TokenStrategy {
    #[default]
    Split,
    Pattern,
}

impl TokenStrategy {
    pub fn extractor(self) -> Box<dyn TokenExtractor> {
        match self {
            TokenStrategy::Split => Box::new(SplitTokenExtractor),
            TokenStrategy::Pattern => Box::new(PatternTokenExtractor),
        }
    }
}
