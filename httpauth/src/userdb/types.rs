use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored user account
///
/// `hash` is the opaque credential digest produced by
/// [`PasswordHasher`](crate::PasswordHasher); it is carried as raw bytes and
/// written as standard base64 text by the document and file backends.
#[derive(Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct UserData {
    /// Unique login name, the primary key in every backend
    pub username: String,
    pub email: String,
    #[serde(with = "digest_base64")]
    pub hash: Vec<u8>,
    /// Role name, looked up in the authorizer's role table
    pub role: String,
}

impl UserData {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        hash: Vec<u8>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            hash,
            role: role.into(),
        }
    }
}

impl std::fmt::Debug for UserData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

mod digest_base64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
