use serde::{Deserialize, Serialize};

use crate::userdb::UserData;

/// Session value holding the authenticated username
pub(super) const USERNAME_KEY: &str = "username";

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password.";
pub const MSG_USERNAME_TAKEN: &str = "Username has been taken.";
pub const MSG_LOGIN_REQUIRED: &str = "Log in to do that.";
pub const MSG_LOGGED_OUT: &str = "Logged out.";
pub const MSG_SAVE_FAILED: &str = "Unable to save user.";

/// The identity bound to a request after a successful `authorize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<UserData> for AuthenticatedUser {
    fn from(user: UserData) -> Self {
        Self {
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}
