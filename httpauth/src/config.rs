//! Environment configuration for an [`Authorizer`](crate::Authorizer)
//!
//! | Variable                  | Default             |
//! |---------------------------|---------------------|
//! | `HTTPAUTH_COOKIE_KEY`     | required            |
//! | `HTTPAUTH_BCRYPT_COST`    | `8`                 |
//! | `HTTPAUTH_ROLES`          | `user:30,admin:80`  |
//! | `HTTPAUTH_DEFAULT_ROLE`   | `user`              |
//! | `HTTPAUTH_COOKIE_MAX_AGE` | `2592000` (30 days) |
//! | `HTTPAUTH_COOKIE_SECURE`  | `true`              |
//! | `HTTPAUTH_BACKEND_TYPE`   | `memory`            |
//! | `HTTPAUTH_BACKEND_URL`    | unset               |

use std::env;

use thiserror::Error;

use crate::password::DEFAULT_BCRYPT_COST;
use crate::role::RoleTable;
use crate::session::{CookieOptions, DEFAULT_COOKIE_MAX_AGE};
use crate::userdb::{BackendConfig, BackendKind};

const DEFAULT_ROLES: &str = "user:30,admin:80";
const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything needed to build an authorizer
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for session cookies
    pub cookie_key: Vec<u8>,
    pub bcrypt_cost: u32,
    pub roles: RoleTable,
    pub default_role: String,
    pub cookie: CookieOptions,
    pub backend: BackendConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cookie_key", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("roles", &self.roles)
            .field("default_role", &self.default_role)
            .field("cookie", &self.cookie)
            .field("backend", &self.backend)
            .finish()
    }
}

impl AuthConfig {
    /// Defaults for everything except the signing key.
    pub fn new(cookie_key: impl Into<Vec<u8>>) -> Self {
        Self {
            cookie_key: cookie_key.into(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            roles: RoleTable::new().with_role("user", 30).with_role("admin", 80),
            default_role: DEFAULT_ROLE.to_string(),
            cookie: CookieOptions::default(),
            backend: BackendConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cookie_key = lookup("HTTPAUTH_COOKIE_KEY")
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("HTTPAUTH_COOKIE_KEY"))?
            .into_bytes();

        let bcrypt_cost = parse_or(&lookup, "HTTPAUTH_BCRYPT_COST", DEFAULT_BCRYPT_COST)?;

        let roles: RoleTable = lookup("HTTPAUTH_ROLES")
            .unwrap_or_else(|| DEFAULT_ROLES.to_string())
            .parse()
            .map_err(|e: crate::role::RoleError| ConfigError::Invalid {
                var: "HTTPAUTH_ROLES",
                reason: e.to_string(),
            })?;
        if roles.is_empty() {
            return Err(ConfigError::Invalid {
                var: "HTTPAUTH_ROLES",
                reason: "at least one role is required".to_string(),
            });
        }

        let default_role = lookup("HTTPAUTH_DEFAULT_ROLE").unwrap_or_else(|| DEFAULT_ROLE.to_string());
        if !roles.contains(&default_role) {
            return Err(ConfigError::Invalid {
                var: "HTTPAUTH_DEFAULT_ROLE",
                reason: format!("role '{default_role}' is not in HTTPAUTH_ROLES"),
            });
        }

        let max_age = parse_or(&lookup, "HTTPAUTH_COOKIE_MAX_AGE", DEFAULT_COOKIE_MAX_AGE)?;
        if max_age <= 0 {
            return Err(ConfigError::Invalid {
                var: "HTTPAUTH_COOKIE_MAX_AGE",
                reason: "must be positive".to_string(),
            });
        }
        let secure = parse_or(&lookup, "HTTPAUTH_COOKIE_SECURE", true)?;

        let kind = match lookup("HTTPAUTH_BACKEND_TYPE") {
            Some(kind) => kind.parse().map_err(|e: crate::userdb::UserError| {
                ConfigError::Invalid {
                    var: "HTTPAUTH_BACKEND_TYPE",
                    reason: e.to_string(),
                }
            })?,
            None => BackendKind::Memory,
        };
        let url = lookup("HTTPAUTH_BACKEND_URL").filter(|u| !u.is_empty());
        if kind != BackendKind::Memory && url.is_none() {
            return Err(ConfigError::Missing("HTTPAUTH_BACKEND_URL"));
        }

        Ok(Self {
            cookie_key,
            bcrypt_cost,
            roles,
            default_role,
            cookie: CookieOptions { max_age, secure },
            backend: BackendConfig::new(kind, url),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
