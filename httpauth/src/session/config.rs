/// Name of the session carrying the authenticated username
pub const AUTH_SESSION: &str = "auth";

/// Name of the session carrying user-facing flash messages
pub const MESSAGES_SESSION: &str = "messages";

/// Name of the session carrying the one-shot return-to path
pub const REDIRECTS_SESSION: &str = "redirects";

/// Default session lifetime: 30 days
pub const DEFAULT_COOKIE_MAX_AGE: i64 = 86400 * 30;

/// Flashes kept per session; older ones are dropped first
pub const MAX_FLASHES: usize = 16;

/// Largest cookie (`name=value`) browsers are required to store
pub const MAX_COOKIE_SIZE: usize = 4096;
