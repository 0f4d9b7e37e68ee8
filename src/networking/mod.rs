//! # networking
//!
//! Networking operations against the Piazza API.
//!
//! This module provides:
//! - a transport seam with a blocking reqwest implementation that keeps cookies
//! - nonce-signed JSON API calls on the "logic" and "main" surfaces
//! - CSRF token retrieval and login
//! - feed pagination and lazy post fetching
//!
//! ## Usage
//!
//! ```no_run
//! use piazza_harvest::networking::{
//!     create_client, authenticate, iterate_posts, Endpoints, FeedOptions, LoginInfo, Session,
//!     SplitTokenExtractor,
//! };
//!
//! let transport = create_client("test", None).expect("Failed to create client");
//! let mut session = Session::new(transport, Endpoints::default());
//! let login = LoginInfo::new("me@school.edu", "secret");
//! authenticate(&mut session, &login, &SplitTokenExtractor).expect("login failed");
//! for fetch in iterate_posts(&session, "m05fat1q3i87bn", FeedOptions::default()) {
//!     println!("{:?}", fetch.expect("transport failure").cid);
//! }
//! ```

// Module declarations
pub mod auth;
pub mod client;
pub mod feed;

// Re-export commonly used items for convenience
pub use auth::blocking::{authenticate, get_token};
pub use auth::{
    LoginInfo, PatternTokenExtractor, SplitTokenExtractor, TokenExtractor, TokenStrategy,
    get_login_info,
};
pub use client::blocking::{HttpTransport, call, call_raw, create_client};
pub use client::{
    ApiRequest, ApiSurface, Endpoints, HttpReply, Outcome, Session, Transport, handle_error,
};
pub use feed::{
    Feed, FeedEntry, FeedOptions, PostFetch, PostIter, get_feed, get_post, iterate_posts,
};

// Re-export types from dependencies for convenience
pub use reqwest::Error as NetworkError;
