//! Error types for the dashboard client
//!
//! Uses thiserror for ergonomic error definitions.
//! Backend failures keep the server's message so it can be shown verbatim.

use thiserror::Error;

/// Custom Result type using our Error
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard client errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure, no usable response
    #[error("HTTP error: {0}")]
    Http(String),

    /// 401/403 from a protected endpoint
    #[error("Authorization failed: HTTP {status}")]
    Unauthorized { status: u16, message: Option<String> },

    /// Validation or business failure reported by the backend
    #[error("Backend error: HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client-side input checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// A guarded action was attempted without a session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DashboardError {
    /// True for failures that invalidate the session
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::Unauthorized { .. } | DashboardError::NotLoggedIn
        )
    }

    /// Message to show next to the triggering form.
    ///
    /// Server and validation messages are passed through; everything else
    /// collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            DashboardError::Api {
                message: Some(message),
                ..
            }
            | DashboardError::Unauthorized {
                message: Some(message),
                ..
            } => message.clone(),
            DashboardError::Validation(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Http(err.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Storage(err.to_string())
    }
}
