//! Blocking HTTP transport and signed API calls

use super::{ApiRequest, ApiSurface, CSRF_HEADER, HttpReply, Session, Transport};
use crate::errors::ScrapeError;
use crate::utils::nonce;
use log::debug;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("piazza-harvest/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] over a blocking reqwest client with a shared cookie jar
pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
}

/// Create a configured HTTP transport for Piazza
///
/// # Arguments
/// * `useragent` - user agent header value
/// * `timeout` - per-request timeout; `None` keeps the reqwest default
///
/// # Example
/// ```no_run
/// use piazza_harvest::networking::create_client;
/// let transport = create_client("test", None).expect("Failed to create client");
/// ```
pub fn create_client(
    useragent: &str,
    timeout: Option<Duration>,
) -> Result<HttpTransport, reqwest::Error> {
    let jar = Arc::new(Jar::default());
    let mut builder = Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .user_agent(useragent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(HttpTransport {
        client: builder.build()?,
        jar,
    })
}

fn into_reply(response: reqwest::blocking::Response) -> Result<HttpReply, ScrapeError> {
    let status = response.status().as_u16();
    debug!("{}", response.status());
    Ok(HttpReply {
        status,
        body: response.text()?,
    })
}

/// Find cookie `name` in a `Cookie` header value (`a=1; b=2`)
pub(crate) fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply, ScrapeError> {
        debug!("GET {}", url);
        into_reply(self.client.get(url).send()?)
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpReply, ScrapeError> {
        debug!("POST form {}", url);
        into_reply(self.client.post(url).form(form).send()?)
    }

    fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpReply, ScrapeError> {
        debug!("POST {}", url);
        let mut request = self.client.post(url).body(serde_json::to_string(body)?);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        into_reply(request.send()?)
    }

    fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        cookie_value(header.to_str().ok()?, name)
    }
}

/// Endpoint URL for `request`; the logic surface also carries the method and a fresh nonce
pub fn signed_endpoint<T: Transport>(
    session: &Session<T>,
    request: &ApiRequest,
) -> Result<String, ScrapeError> {
    let endpoint = session.endpoints().api(request.surface);
    if request.surface != ApiSurface::Logic {
        return Ok(endpoint);
    }
    let mut url = Url::parse(&endpoint).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
    let aid = nonce();
    debug!("nonce for {} is {}", request.method, aid);
    url.query_pairs_mut()
        .append_pair("method", request.method)
        .append_pair("aid", &aid);
    Ok(url.into())
}

/// Issue `request` and return the whole reply
pub fn call_raw<T: Transport>(
    session: &Session<T>,
    request: &ApiRequest,
) -> Result<HttpReply, ScrapeError> {
    let endpoint = signed_endpoint(session, request)?;
    // The header carries the session_id cookie, not the token from the CSRF page.
    // Upstream clients send it this way and the API accepts it.
    let session_id = session.session_id();
    let headers: Vec<(&str, &str)> = session_id
        .as_deref()
        .map(|id| vec![(CSRF_HEADER, id)])
        .unwrap_or_default();
    let reply = session
        .transport()
        .post_json(&endpoint, &request.body(), &headers)?;
    debug!("{} answered {}", request.method, reply.status);
    Ok(reply)
}

/// Issue `request` and parse the reply body as JSON
pub fn call<T: Transport>(session: &Session<T>, request: &ApiRequest) -> Result<Value, ScrapeError> {
    let reply = call_raw(session, request)?;
    Ok(serde_json::from_str(&reply.body)?)
}
