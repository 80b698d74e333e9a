use std::collections::BTreeMap;

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, Request, request::Parts};

/// Mock browser for exercising the authorizer without an HTTP server
///
/// Keeps a cookie jar, turns it into request parts for each call and applies
/// the `Set-Cookie` headers an operation queued, including deletions by
/// `Max-Age=0`.
#[derive(Debug, Default)]
pub struct MockBrowser {
    cookies: BTreeMap<String, String>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request parts for `path` carrying the current cookie jar
    pub fn request(&self, path: &str) -> Parts {
        let mut builder = Request::builder().uri(path);
        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        builder.body(()).unwrap().into_parts().0
    }

    /// Apply the `Set-Cookie` headers of a response to the jar
    pub fn absorb(&mut self, response: &HeaderMap) {
        for value in response.get_all(SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap();
            let (name, cookie) = pair.split_once('=').unwrap();

            if value.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), cookie.to_string());
            }
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Overwrite a cookie, e.g. to simulate tampering
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }
}
