//! Authenticated session state.
//!
//! A [`Session`] only comes into existence from a successful login (or an
//! explicitly supplied token) and is handed by reference to whatever makes
//! authenticated calls. [`Session::logout`] consumes it.

use crate::models::{LoginResponse, Role, SessionUser};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use tracing::info;

pub struct Session {
    token: SecretString,
    /// Profile of the signed-in user; unknown for token-only sessions.
    user: Option<SessionUser>,
}

impl Session {
    /// Create a session from a login response.
    pub fn from_login(response: LoginResponse) -> Self {
        info!("Signed in as {} ({})", response.user.email, response.user.role);
        Self {
            token: SecretString::new(response.token),
            user: Some(response.user),
        }
    }

    /// Create a session from a pre-issued bearer token.
    pub fn from_token(token: String) -> Self {
        Self {
            token: SecretString::new(token),
            user: None,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Whether the user is known to be an administrator.
    ///
    /// Token-only sessions answer `false`; the API remains the authority.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }

    /// Value of the `Authorization` header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    /// End the session.
    pub fn logout(self) {
        match &self.user {
            Some(user) => info!("Signed out {}", user.email),
            None => info!("Session ended"),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}
