use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::MAX_FLASHES;

/// Cookie attributes applied to every session cookie a store writes
#[derive(Debug, Clone, PartialEq)]
pub struct CookieOptions {
    /// Lifetime in seconds of a saved session; also the age after which a
    /// presented cookie is rejected as expired.
    pub max_age: i64,
    /// Emit the `Secure` attribute
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: super::config::DEFAULT_COOKIE_MAX_AGE,
            secure: true,
        }
    }
}

/// One named session carried by one cookie
///
/// Values are plain strings keyed by name. The flash queue is a FIFO of
/// one-shot strings drained by [`Session::flashes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    values: HashMap<String, String>,
    flashes: Vec<String>,
    is_new: bool,
    expired: bool,
}

impl Session {
    /// A fresh session that did not arrive with the request.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
            flashes: Vec::new(),
            is_new: true,
            expired: false,
        }
    }

    pub(super) fn from_payload(name: &str, payload: SessionPayload) -> Self {
        Self {
            name: name.to_string(),
            values: payload.values,
            flashes: payload.flashes,
            is_new: false,
            expired: false,
        }
    }

    pub(super) fn to_payload(&self, issued_at: i64) -> SessionPayload {
        SessionPayload {
            values: self.values.clone(),
            flashes: self.flashes.clone(),
            issued_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when no cookie for this session came with the request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Queue a flash, dropping the oldest once [`MAX_FLASHES`] are pending.
    pub fn add_flash(&mut self, value: impl Into<String>) {
        if self.flashes.len() >= MAX_FLASHES {
            let excess = self.flashes.len() + 1 - MAX_FLASHES;
            self.flashes.drain(..excess);
        }
        self.flashes.push(value.into());
    }

    /// Drain the flash queue in insertion order.
    pub fn flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    /// Drop all state and mark the cookie for immediate expiry (max-age 0).
    pub fn expire(&mut self) {
        self.values.clear();
        self.flashes.clear();
        self.expired = true;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Max-age to emit on save given the store default.
    pub fn max_age(&self, default: i64) -> i64 {
        if self.expired { 0 } else { default }
    }
}

/// Serialized form carried inside the signed cookie
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct SessionPayload {
    #[serde(default)]
    pub(super) values: HashMap<String, String>,
    #[serde(default)]
    pub(super) flashes: Vec<String>,
    pub(super) issued_at: i64,
}
