//! Signed cookie session store
//!
//! A cookie value has the form `payload.signature`, where `payload` is the
//! base64url JSON of the session and `signature` is the base64url
//! HMAC-SHA256 of `name|payload` under the store key. Binding the cookie name
//! into the MAC stops a valid `messages` cookie from being replayed as `auth`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::utils::{base64url_decode, base64url_encode, get_cookie, header_set_cookie};

use super::config::MAX_COOKIE_SIZE;
use super::errors::SessionError;
use super::store::SessionStore;
use super::types::{CookieOptions, Session, SessionPayload};

type HmacSha256 = Hmac<Sha256>;

pub struct CookieSessionStore {
    key: Vec<u8>,
    options: CookieOptions,
}

impl std::fmt::Debug for CookieSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSessionStore")
            .field("key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl CookieSessionStore {
    /// Create a store signing with `key`. Changing the key invalidates every
    /// outstanding cookie.
    pub fn new(key: impl Into<Vec<u8>>, options: CookieOptions) -> Result<Self, SessionError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SessionError::EmptyKey);
        }
        Ok(Self { key, options })
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn sign(&self, name: &str, payload: &str) -> Result<Vec<u8>, SessionError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| SessionError::Cookie(e.to_string()))?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let json = serde_json::to_vec(&session.to_payload(Utc::now().timestamp()))?;
        let payload = base64url_encode(&json);
        let signature = base64url_encode(&self.sign(session.name(), &payload)?);
        Ok(format!("{payload}.{signature}"))
    }

    fn decode(&self, name: &str, value: &str) -> Result<Session, SessionError> {
        let (payload, signature) = value
            .rsplit_once('.')
            .ok_or_else(|| SessionError::Malformed("Missing signature".to_string()))?;

        let presented = base64url_decode(signature)?;
        let expected = self.sign(name, payload)?;
        if !bool::from(presented.ct_eq(&expected)) {
            return Err(SessionError::InvalidSignature);
        }

        let payload: SessionPayload = serde_json::from_slice(&base64url_decode(payload)?)?;
        if payload.issued_at.saturating_add(self.options.max_age) < Utc::now().timestamp() {
            return Err(SessionError::Expired);
        }

        Ok(Session::from_payload(name, payload))
    }
}

impl SessionStore for CookieSessionStore {
    fn get(&self, headers: &HeaderMap, name: &str) -> Result<Session, SessionError> {
        match get_cookie(headers, name) {
            Some(value) => self.decode(name, &value),
            None => Ok(Session::new(name)),
        }
    }

    fn save(&self, session: &Session, response: &mut HeaderMap) -> Result<(), SessionError> {
        let max_age = session.max_age(self.options.max_age);
        let value = if max_age <= 0 {
            String::new()
        } else {
            self.encode(session)?
        };

        let size = session.name().len() + 1 + value.len();
        if size > MAX_COOKIE_SIZE {
            return Err(SessionError::TooLarge(size));
        }

        header_set_cookie(
            response,
            session.name(),
            &value,
            max_age,
            self.options.secure,
        )?;
        Ok(())
    }
}
