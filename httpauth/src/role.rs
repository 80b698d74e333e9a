//! Role table and privilege comparison

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoleError {
    #[error("Invalid role entry '{0}', expected name:level")]
    InvalidEntry(String),

    #[error("Invalid privilege level for role '{role}': {value}")]
    InvalidLevel { role: String, value: String },

    #[error("Duplicate role: {0}")]
    Duplicate(String),
}

/// Static mapping from role name to privilege level
///
/// Levels form a total order; higher is more capable. The table is fixed once
/// handed to an `Authorizer`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleTable {
    levels: HashMap<String, i32>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any previous level for `role`.
    pub fn with_role(mut self, role: impl Into<String>, level: i32) -> Self {
        self.levels.insert(role.into(), level);
        self
    }

    pub fn level(&self, role: &str) -> Option<i32> {
        self.levels.get(role).copied()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.levels.contains_key(role)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether a user holding `role` may act where `required` is demanded.
    ///
    /// Fails closed: if either role is missing from the table the answer is
    /// `false`.
    pub fn permits(&self, role: &str, required: &str) -> bool {
        match (self.level(role), self.level(required)) {
            (Some(have), Some(need)) => have >= need,
            _ => false,
        }
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for RoleTable {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self {
            levels: iter.into_iter().map(|(r, l)| (r.into(), l)).collect(),
        }
    }
}

/// Parses `"user:30,admin:80"`. Whitespace around entries is ignored.
impl FromStr for RoleTable {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut levels = HashMap::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (role, level) = entry
                .split_once(':')
                .ok_or_else(|| RoleError::InvalidEntry(entry.to_string()))?;
            let role = role.trim();
            if role.is_empty() {
                return Err(RoleError::InvalidEntry(entry.to_string()));
            }

            let level: i32 = level.trim().parse().map_err(|_| RoleError::InvalidLevel {
                role: role.to_string(),
                value: level.trim().to_string(),
            })?;

            if levels.insert(role.to_string(), level).is_some() {
                return Err(RoleError::Duplicate(role.to_string()));
            }
        }

        Ok(Self { levels })
    }
}
