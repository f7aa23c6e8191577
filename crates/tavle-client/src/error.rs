use thiserror::Error;

/// Message shown when the server rejects a login without saying why.
pub const DEFAULT_LOGIN_ERROR: &str = "Invalid login credentials";

/// Login failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the credentials. Carries the server-supplied
    /// message, or [`DEFAULT_LOGIN_ERROR`] when the server sent none.
    #[error("{0}")]
    Rejected(String),

    /// The login endpoint could not be reached or answered garbage.
    #[error("Login request failed: {0}")]
    Unreachable(String),
}

/// Failures of authorized calls.
///
/// `NoToken` means "never logged in" and `RefreshFailed` means "was logged
/// in, session expired" -- both route the caller to the login screen, but
/// they are distinct conditions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No access token is stored; the request was not sent.
    #[error("No access token stored")]
    NoToken,

    /// The access token expired and the refresh attempt failed. Both
    /// tokens have been cleared.
    #[error("Session expired and token refresh failed")]
    RefreshFailed,

    /// The request failed for a reason a token refresh cannot fix.
    #[error("Request failed: {message}")]
    RequestFailed {
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        message: String,
    },
}

impl SessionError {
    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        SessionError::RequestFailed {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}
