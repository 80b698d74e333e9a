mod core;
mod errors;
mod types;

pub use self::core::Authorizer;
pub use errors::AuthError;
pub use types::{
    AuthenticatedUser, MSG_INVALID_CREDENTIALS, MSG_LOGGED_OUT, MSG_LOGIN_REQUIRED,
    MSG_SAVE_FAILED, MSG_USERNAME_TAKEN,
};
