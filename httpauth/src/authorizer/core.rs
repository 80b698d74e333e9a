use std::sync::Arc;

use http::HeaderMap;
use http::request::Parts;
use tokio::sync::OnceCell;

use crate::config::AuthConfig;
use crate::password::PasswordHasher;
use crate::role::RoleTable;
use crate::session::{
    AUTH_SESSION, CookieSessionStore, MESSAGES_SESSION, REDIRECTS_SESSION, Session, SessionStore,
};
use crate::userdb::{AuthBackend, UserData, open_backend};

use super::errors::AuthError;
use super::types::{
    AuthenticatedUser, MSG_INVALID_CREDENTIALS, MSG_LOGGED_OUT, MSG_LOGIN_REQUIRED,
    MSG_SAVE_FAILED, MSG_USERNAME_TAKEN, USERNAME_KEY,
};

/// Login, registration, logout and authorization over a pluggable user store
///
/// Each session is either anonymous or bound to one username held in the
/// `auth` session. Every request-scoped operation reads cookies from the
/// request parts and queues `Set-Cookie` headers into the response header map
/// it is given. The authorizer holds no per-request state and is shared
/// behind an `Arc`.
pub struct Authorizer {
    backend: Arc<dyn AuthBackend>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    roles: RoleTable,
    default_role: String,
    /// Digest verified against when a login names an unknown user
    dummy_digest: OnceCell<Vec<u8>>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("hasher", &self.hasher)
            .field("roles", &self.roles)
            .field("default_role", &self.default_role)
            .finish_non_exhaustive()
    }
}

impl Authorizer {
    /// Fails with [`AuthError::Config`] if `default_role` is not in `roles`.
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        sessions: Arc<dyn SessionStore>,
        roles: RoleTable,
        default_role: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let default_role = default_role.into();
        if !roles.contains(&default_role) {
            return Err(AuthError::Config(format!(
                "Default role '{default_role}' is not in the role table"
            )));
        }

        Ok(Self {
            backend,
            sessions,
            hasher: PasswordHasher::default(),
            roles,
            default_role,
            dummy_digest: OnceCell::new(),
        })
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self.dummy_digest = OnceCell::new();
        self
    }

    /// Build the backend, cookie store and hasher described by `config`.
    pub async fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let backend = open_backend(&config.backend).await?;
        let sessions = CookieSessionStore::new(config.cookie_key.clone(), config.cookie.clone())
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let hasher =
            PasswordHasher::new(config.bcrypt_cost).map_err(|e| AuthError::Config(e.to_string()))?;

        Ok(Self::new(
            backend,
            Arc::new(sessions),
            config.roles.clone(),
            config.default_role.clone(),
        )?
        .with_hasher(hasher))
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Authenticate `username` and bind it to the session.
    ///
    /// Returns the URL to redirect to: the page saved by a failed
    /// `authorize`, if any, otherwise `destination`.
    #[tracing::instrument(skip(self, req, res, password))]
    pub async fn login(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        username: &str,
        password: &str,
        destination: &str,
    ) -> Result<String, AuthError> {
        let mut auth = self.sessions.get_or_new(&req.headers, AUTH_SESSION);
        if auth.get(USERNAME_KEY).is_some() {
            return Err(AuthError::AlreadyAuthenticated);
        }

        let verified = match self.backend.user(username).await? {
            Some(user) => self.hasher.verify(&user.hash, username, password).await,
            None => {
                self.burn_verify(username, password).await;
                false
            }
        };
        if !verified {
            tracing::debug!("Rejected credentials");
            self.flash(req, res, MSG_INVALID_CREDENTIALS)?;
            return Err(AuthError::InvalidCredentials);
        }

        auth.set(USERNAME_KEY, username);
        self.sessions.save(&auth, res)?;

        let mut redirects = self
            .sessions
            .get_latest(&req.headers, res, REDIRECTS_SESSION);
        let target = redirects
            .flashes()
            .into_iter()
            .next()
            .unwrap_or_else(|| destination.to_string());
        if !redirects.is_new() {
            self.sessions.save(&redirects, res)?;
        }

        tracing::info!(target = %target, "User logged in");
        Ok(target)
    }

    /// Create an account with the default role.
    pub async fn register(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), AuthError> {
        self.register_with_role(req, res, username, password, email, &self.default_role)
            .await
    }

    /// Create an account holding `role`, which must be in the role table.
    #[tracing::instrument(skip(self, req, res, password, email))]
    pub async fn register_with_role(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        username: &str,
        password: &str,
        email: &str,
        role: &str,
    ) -> Result<(), AuthError> {
        if !self.roles.contains(role) {
            return Err(AuthError::UnknownRole(role.to_string()));
        }

        if self.backend.user(username).await?.is_some() {
            self.flash(req, res, MSG_USERNAME_TAKEN)?;
            return Err(AuthError::UserExists(username.to_string()));
        }

        let hash = self.hasher.hash(username, password).await?;

        if let Err(e) = self
            .backend
            .save_user(UserData::new(username, email, hash, role))
            .await
        {
            tracing::error!(error = %e, "Failed to save new user");
            self.flash(req, res, MSG_SAVE_FAILED)?;
            return Err(AuthError::Storage(e));
        }

        tracing::info!("User registered");
        Ok(())
    }

    /// Check that the request carries a session bound to an existing user,
    /// optionally holding at least `require_role`.
    ///
    /// When `redirect_on_failure` is set, an unauthenticated request has its
    /// path saved for the next successful login and gets a "log in" message.
    /// Insufficient privilege never triggers that, since logging in again
    /// would not help.
    #[tracing::instrument(skip(self, req, res), fields(path = %req.uri.path()))]
    pub async fn authorize(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        require_role: Option<&str>,
        redirect_on_failure: bool,
    ) -> Result<AuthenticatedUser, AuthError> {
        let user = self.session_user(req, res, redirect_on_failure).await?;

        if let Some(required) = require_role {
            if !self.roles.permits(&user.role, required) {
                return Err(AuthError::InsufficientPrivilege {
                    role: user.role,
                    required: required.to_string(),
                });
            }
        }

        Ok(user.into())
    }

    /// Shorthand for [`authorize`](Self::authorize) with a required role.
    pub async fn authorize_role(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        role: &str,
        redirect_on_failure: bool,
    ) -> Result<AuthenticatedUser, AuthError> {
        self.authorize(req, res, Some(role), redirect_on_failure)
            .await
    }

    /// End the session. Always succeeds unless the cookies cannot be written.
    pub fn logout(&self, req: &Parts, res: &mut HeaderMap) -> Result<(), AuthError> {
        let mut auth = self.sessions.get_or_new(&req.headers, AUTH_SESSION);
        if let Some(username) = auth.get(USERNAME_KEY) {
            tracing::info!(username = %username, "User logged out");
        }
        auth.expire();
        self.sessions.save(&auth, res)?;

        self.flash(req, res, MSG_LOGGED_OUT)
    }

    /// Drain pending user-facing messages, oldest first.
    pub fn messages(&self, req: &Parts, res: &mut HeaderMap) -> Vec<String> {
        let mut session = self
            .sessions
            .get_latest(&req.headers, res, MESSAGES_SESSION);
        let messages = session.flashes();

        if !session.is_new() {
            if let Err(e) = self.sessions.save(&session, res) {
                tracing::warn!(error = %e, "Failed to save drained message session");
            }
        }
        messages
    }

    /// Queue a user-facing message for the next `messages` call.
    pub fn flash(&self, req: &Parts, res: &mut HeaderMap, message: &str) -> Result<(), AuthError> {
        let mut session = self
            .sessions
            .get_latest(&req.headers, res, MESSAGES_SESSION);
        session.add_flash(message);
        self.sessions.save(&session, res)?;
        Ok(())
    }

    /// Stored record of the session's user, without side effects.
    pub async fn current_user(&self, req: &Parts) -> Result<UserData, AuthError> {
        let mut discarded = HeaderMap::new();
        self.session_user(req, &mut discarded, false).await
    }

    /// Change the current user's password and/or email.
    #[tracing::instrument(skip_all)]
    pub async fn update(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        password: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut user = self.session_user(req, res, false).await?;

        if let Some(password) = password {
            user.hash = self.hasher.hash(&user.username, password).await?;
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }

        let username = user.username.clone();
        self.backend.save_user(user).await?;
        tracing::info!(username = %username, "User updated");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<(), AuthError> {
        self.backend.delete_user(username).await?;
        tracing::info!("User deleted");
        Ok(())
    }

    pub async fn users(&self) -> Result<Vec<UserData>, AuthError> {
        Ok(self.backend.users().await?)
    }

    /// Release backend connections.
    pub async fn close(&self) {
        self.backend.close().await;
    }

    /// Resolve the session's username to a stored user, applying the
    /// unauthenticated side effects when asked.
    async fn session_user(
        &self,
        req: &Parts,
        res: &mut HeaderMap,
        redirect_on_failure: bool,
    ) -> Result<UserData, AuthError> {
        let mut auth = match self.sessions.get(&req.headers, AUTH_SESSION) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(error = %e, "Auth session unreadable");
                if redirect_on_failure {
                    self.go_back(req, res)?;
                }
                return Err(AuthError::SessionUnavailable(e));
            }
        };

        let Some(username) = auth.get(USERNAME_KEY).map(str::to_string) else {
            if redirect_on_failure {
                self.go_back(req, res)?;
            }
            return Err(AuthError::NotAuthenticated);
        };

        match self.backend.user(&username).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(username = %username, "Expiring session of missing user");
                auth.expire();
                self.sessions.save(&auth, res)?;
                if redirect_on_failure {
                    self.go_back(req, res)?;
                }
                Err(AuthError::UserVanished(username))
            }
        }
    }

    /// Remember the requested path for the next login and ask the user to log in.
    fn go_back(&self, req: &Parts, res: &mut HeaderMap) -> Result<(), AuthError> {
        let mut redirects = Session::new(REDIRECTS_SESSION);
        redirects.add_flash(req.uri.path());
        if let Err(e) = self.sessions.save(&redirects, res) {
            // Paths too long for a cookie are not remembered
            tracing::warn!(error = %e, "Failed to save return path");
        }

        self.flash(req, res, MSG_LOGIN_REQUIRED)
    }

    /// Spend the same bcrypt work as a real verification.
    async fn burn_verify(&self, username: &str, password: &str) {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.hasher.hash("", "httpauth-dummy"))
            .await;
        if let Ok(digest) = digest {
            let _ = self.hasher.verify(digest, username, password).await;
        }
    }
}
