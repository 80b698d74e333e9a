use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use headers::{Cookie, HeaderMapExt};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Generate `len` random bytes from the system CSPRNG.
///
/// Intended for producing a cookie signing key when none is configured.
pub fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

/// Look up a cookie value by name in the request headers.
pub(crate) fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|cookies| cookies.get(name).map(str::to_string))
}

/// Value of the `Set-Cookie` already queued in `headers` for `name`, if any.
pub(crate) fn pending_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&prefix))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

/// Queue a `Set-Cookie` header, replacing any header already queued for the
/// same cookie name so the last save within a response wins.
pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
    secure: bool,
) -> Result<(), UtilError> {
    let secure = if secure { " Secure;" } else { "" };
    let cookie = format!("{name}={value}; SameSite=Lax;{secure} HttpOnly; Path=/; Max-Age={max_age}");
    let cookie: HeaderValue = cookie
        .parse()
        .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?;

    let prefix = format!("{name}=");
    let kept: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|v| !v.as_bytes().starts_with(prefix.as_bytes()))
        .cloned()
        .collect();

    headers.remove(SET_COOKIE);
    for value in kept {
        headers.append(SET_COOKIE, value);
    }
    headers.append(SET_COOKIE, cookie);
    Ok(())
}
