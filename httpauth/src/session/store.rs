use http::HeaderMap;
use http::header::{COOKIE, HeaderValue};

use crate::utils::pending_cookie;

use super::errors::SessionError;
use super::types::Session;

/// Cookie-backed key/value session transport
///
/// `get` reads the named session from request headers; a missing cookie
/// yields a new, empty session rather than an error. An error means the
/// cookie was present but could not be trusted (bad signature after a key
/// change, corruption, or expiry).
///
/// `save` commits the session into the response headers.
pub trait SessionStore: Send + Sync {
    fn get(&self, headers: &HeaderMap, name: &str) -> Result<Session, SessionError>;

    fn save(&self, session: &Session, response: &mut HeaderMap) -> Result<(), SessionError>;

    /// Like `get`, but an untrusted cookie is replaced by a fresh session.
    fn get_or_new(&self, headers: &HeaderMap, name: &str) -> Session {
        self.get(headers, name).unwrap_or_else(|e| {
            tracing::debug!(session = name, error = %e, "Discarding unreadable session");
            Session::new(name)
        })
    }

    /// The session as this response will leave it: a save already queued in
    /// `response` takes precedence over the cookie sent with the request.
    fn get_latest(&self, request: &HeaderMap, response: &HeaderMap, name: &str) -> Session {
        let Some(value) = pending_cookie(response, name) else {
            return self.get_or_new(request, name);
        };
        if value.is_empty() {
            return Session::new(name);
        }

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&format!("{name}={value}")) {
            Ok(cookie) => {
                headers.insert(COOKIE, cookie);
                self.get_or_new(&headers, name)
            }
            Err(_) => Session::new(name),
        }
    }
}
