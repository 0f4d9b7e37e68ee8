//! Blocking authentication flow for Piazza
use super::{LoginInfo, TokenExtractor};
use crate::errors::ScrapeError;
use crate::networking::client::{Session, Transport};
use log::{debug, error, info, warn};

const TOKEN_MARKER: &str = "CSRF_TOKEN";
const LOGIN_ERROR_MARKER: &str = "VAR ERROR_MSG";

/// Get a CSRF token from the unauthenticated token page
///
/// # Arguments
/// * `session` - session whose transport fetches the page
/// * `extractor` - strategy that pulls the token out of the page body
///
/// # Returns
/// * the token, or [`ScrapeError::CsrfTokenMissing`] when the page does not carry one
pub fn get_token<T: Transport>(
    session: &Session<T>,
    extractor: &dyn TokenExtractor,
) -> Result<String, ScrapeError> {
    let page = session.transport().get(&session.endpoints().csrf_token())?;
    if !page.body.to_uppercase().contains(TOKEN_MARKER) {
        error!("ERROR with CSRF_TOKEN: marker absent from token page");
        return Err(ScrapeError::CsrfTokenMissing);
    }
    let token = extractor.extract(&page.body).ok_or_else(|| {
        error!("ERROR with CSRF_TOKEN: marker present but no token could be extracted");
        ScrapeError::CsrfTokenMissing
    })?;
    debug!("Token is: {}", token);
    Ok(token)
}

/// Log in to Piazza, leaving the session cookie in the transport's jar
///
/// # Arguments
/// * `session` - session to authenticate; receives the CSRF token
/// * `login` - credentials
/// * `extractor` - CSRF token extraction strategy
///
/// # Returns
/// * `Ok(true)` when the login was accepted, `Ok(false)` when the server rejected it
///   (non-200 status or an error message in the page)
pub fn authenticate<T: Transport>(
    session: &mut Session<T>,
    login: &LoginInfo,
    extractor: &dyn TokenExtractor,
) -> Result<bool, ScrapeError> {
    let token = get_token(session, extractor)?;
    session.set_csrf_token(token.clone());

    let response = session.transport().post_form(
        &session.endpoints().login(),
        &[
            ("from", "/signup"),
            ("email", &*login.email),
            ("password", &*login.password),
            ("remember", "on"),
            ("csrf_token", token.as_str()),
        ],
    )?;

    let mut accepted = true;
    if response.status != 200 {
        warn!("Response status not 200: {}", response.status);
        accepted = false;
    }
    if response.body.to_uppercase().contains(LOGIN_ERROR_MARKER) {
        warn!("Login page reported an error");
        accepted = false;
    }
    if accepted {
        info!("logged in");
    }
    Ok(accepted)
}
