//! Request plumbing for the Piazza JSON API
//!
//! The [`Transport`] trait is the seam between the API logic and the HTTP stack. The production
//! implementation lives in [`blocking`]; anything that can answer GET and POST requests and look up
//! a cookie can stand in for it.

pub mod blocking;

use crate::errors::ScrapeError;
use log::warn;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Default Piazza host
pub const DEFAULT_BASE_URL: &str = "https://piazza.com";
/// Cookie holding the session identifier after login
pub const SESSION_COOKIE: &str = "session_id";
/// Header the API expects the session identifier in
pub const CSRF_HEADER: &str = "CSRF-Token";

/// Status and body of a finished HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Minimal HTTP surface the scraper needs
pub trait Transport {
    /// GET `url` and return the body as text
    fn get(&self, url: &str) -> Result<HttpReply, ScrapeError>;
    /// POST a url-encoded form
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpReply, ScrapeError>;
    /// POST `body` serialized as a raw JSON string with the extra `headers`
    fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpReply, ScrapeError>;
    /// Value of cookie `name` that would be sent to `url`
    fn cookie(&self, url: &str, name: &str) -> Option<String>;
}

/// The two API surfaces Piazza exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiSurface {
    #[default]
    Logic,
    Main,
}

impl ApiSurface {
    fn path(self) -> &'static str {
        match self {
            ApiSurface::Logic => "logic",
            ApiSurface::Main => "main",
        }
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ApiSurface {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logic" => Ok(ApiSurface::Logic),
            "main" => Ok(ApiSurface::Main),
            other => Err(ScrapeError::UnknownSurface(other.to_string())),
        }
    }
}

/// URLs derived from a single host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// JSON API endpoint of `surface`
    pub fn api(&self, surface: ApiSurface) -> String {
        format!("{}/{}/api", self.base, surface.path())
    }

    /// Unauthenticated page carrying the CSRF token
    pub fn csrf_token(&self) -> String {
        format!("{}/main/csrf_token", self.base)
    }

    pub fn login(&self) -> String {
        format!("{}/class", self.base)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Authenticated state for one scraping run
pub struct Session<T: Transport> {
    transport: T,
    endpoints: Endpoints,
    csrf_token: Option<String>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            csrf_token: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = Some(token);
    }

    /// Session identifier cookie set by the login endpoint, if any
    pub fn session_id(&self) -> Option<String> {
        self.transport.cookie(self.endpoints.base(), SESSION_COOKIE)
    }
}

/// One JSON-RPC style call
#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    pub method: &'a str,
    pub params: Map<String, Value>,
    pub network_id: Option<&'a str>,
    pub network_id_key: &'a str,
    pub surface: ApiSurface,
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: &'a str) -> Self {
        Self {
            method,
            params: Map::new(),
            network_id: None,
            network_id_key: "nid",
            surface: ApiSurface::Logic,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn network(mut self, network_id: &'a str) -> Self {
        self.network_id = Some(network_id);
        self
    }

    /// Some methods expect the network under `id` instead of `nid`
    pub fn network_id_key(mut self, key: &'a str) -> Self {
        self.network_id_key = key;
        self
    }

    pub fn surface(mut self, surface: ApiSurface) -> Self {
        self.surface = surface;
        self
    }

    /// `{method, params: {<network_id_key>: network_id, ..params}}`; explicit params win
    pub fn body(&self) -> Value {
        let mut params = Map::new();
        params.insert(
            self.network_id_key.to_string(),
            self.network_id
                .map(|nid| Value::String(nid.to_string()))
                .unwrap_or(Value::Null),
        );
        for (key, value) in &self.params {
            params.insert(key.clone(), value.clone());
        }
        let mut body = Map::new();
        body.insert("method".to_string(), Value::String(self.method.to_string()));
        body.insert("params".to_string(), Value::Object(params));
        Value::Object(body)
    }
}

/// Result of an API call that can fail without ending the run
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    /// The server reported an error; carries a description for the run summary
    Skipped(String),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Found(value) => Outcome::Found(f(value)),
            Outcome::Skipped(reason) => Outcome::Skipped(reason),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// Check a response body for an `error` field
///
/// # Arguments
/// * `response` - the parsed response body
/// * `err_msg` - message logged when the body carries an error
///
/// # Returns
/// * the `result` field, or [`Outcome::Skipped`] when the server reported an error
pub fn handle_error(response: Value, err_msg: &str) -> Outcome<Value> {
    match response.get("error") {
        Some(error) if is_truthy(error) => {
            let detail = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warn!("{}: {}", err_msg, detail);
            Outcome::Skipped(format!("{err_msg}: {detail}"))
        }
        _ => Outcome::Found(response.get("result").cloned().unwrap_or(Value::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn surface_parses_known_names_only() {
        assert_eq!("logic".parse::<ApiSurface>().unwrap(), ApiSurface::Logic);
        assert_eq!("main".parse::<ApiSurface>().unwrap(), ApiSurface::Main);
        assert!(matches!(
            "admin".parse::<ApiSurface>(),
            Err(ScrapeError::UnknownSurface(name)) if name == "admin"
        ));
    }

    #[test]
    fn endpoints_derive_from_base() {
        let endpoints = Endpoints::new("http://localhost:8080/");
        assert_eq!(endpoints.api(ApiSurface::Logic), "http://localhost:8080/logic/api");
        assert_eq!(endpoints.api(ApiSurface::Main), "http://localhost:8080/main/api");
        assert_eq!(endpoints.csrf_token(), "http://localhost:8080/main/csrf_token");
        assert_eq!(endpoints.login(), "http://localhost:8080/class");
        assert_eq!(Endpoints::default().base(), "https://piazza.com");
    }

    #[test]
    fn body_nests_network_with_params_and_params_win() {
        let request = ApiRequest::new("content.get")
            .network("abc")
            .param("cid", "k1")
            .param("student_view", Value::Null);
        assert_eq!(
            request.body(),
            json!({"method": "content.get", "params": {"nid": "abc", "cid": "k1", "student_view": null}})
        );

        let overridden = ApiRequest::new("network.get_users")
            .network("abc")
            .network_id_key("id")
            .param("id", "other");
        assert_eq!(overridden.body()["params"], json!({"id": "other"}));
    }

    #[test]
    fn body_without_network_sends_null() {
        let body = ApiRequest::new("user.status").body();
        assert_eq!(body["params"]["nid"], Value::Null);
    }

    #[test]
    fn handle_error_returns_result_when_error_is_null() {
        let outcome = handle_error(json!({"result": {"feed": []}, "error": null}), "nope");
        assert_eq!(outcome, Outcome::Found(json!({"feed": []})));
    }

    #[test]
    fn handle_error_skips_on_error_field() {
        let outcome = handle_error(json!({"result": null, "error": "Post not found"}), "Could not get post 7.");
        assert_eq!(
            outcome,
            Outcome::Skipped("Could not get post 7.: Post not found".to_string())
        );
        assert!(outcome.is_skipped());
    }

    #[test]
    fn handle_error_treats_empty_error_as_success() {
        let outcome = handle_error(json!({"result": 5, "error": ""}), "x");
        assert_eq!(outcome.found(), Some(json!(5)));
    }
}
