use thiserror::Error;
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("regex error: {0}")]
    RegexError(String),
    #[error("Base is too large: the digit set only allows bases up to {max}, got {base}")]
    BaseTooLarge { base: u32, max: usize },
    #[error("Base must be at least 2, got {0}")]
    BaseTooSmall(u32),
    #[error("invalid digit {digit:?} for base {base}")]
    InvalidDigit { digit: char, base: u32 },
    #[error("unknown api surface: {0}")]
    UnknownSurface(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("could not get CSRF token")]
    CsrfTokenMissing,
    #[error("could not authenticate: {0}")]
    AuthFailed(String),
    #[error("could not get the feed: {0}")]
    FeedError(String),
    #[error("malformed post: {0}")]
    MalformedPost(String),
    #[error("login file error: {0}")]
    LoginFileError(String),
    #[error("{0}")]
    GenericError(String),
}

impl ScrapeError {
    /// Process exit code for a run that ended with this error
    pub fn exit_code(&self) -> u8 {
        match self {
            ScrapeError::CsrfTokenMissing | ScrapeError::AuthFailed(_) => 1,
            _ => 3,
        }
    }
}
