//! Authenticated session value object.
//!
//! Client and admin sessions are tracked independently; which one an
//! operation uses is always an explicit argument, never inferred from
//! ambient state such as the current URL path.

use secrecy::{ExposeSecret, SecretString};

use lapacho_core::{SessionRole, UserId};

/// A bearer-token session for one of the two roles.
#[derive(Clone)]
pub struct AuthSession {
    role: SessionRole,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    user_id: Option<UserId>,
}

impl AuthSession {
    /// Create a session for the given role.
    #[must_use]
    pub fn new(role: SessionRole, access_token: impl Into<String>) -> Self {
        Self {
            role,
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
            user_id: None,
        }
    }

    /// Convenience constructor for a client session.
    #[must_use]
    pub fn client(access_token: impl Into<String>) -> Self {
        Self::new(SessionRole::Client, access_token)
    }

    /// Convenience constructor for an admin session.
    #[must_use]
    pub fn admin(access_token: impl Into<String>) -> Self {
        Self::new(SessionRole::Admin, access_token)
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    /// Attach the authenticated user's id.
    #[must_use]
    pub const fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub const fn role(&self) -> SessionRole {
        self.role
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The `Authorization` header value for this session.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("role", &self.role)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("user_id", &self.user_id)
            .finish()
    }
}
