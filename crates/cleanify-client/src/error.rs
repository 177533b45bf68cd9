//! Client error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No session, or the session token has expired.
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Input rejected before any remote call was made.
    #[error("{message}")]
    Validation { message: String },

    #[error("Cannot {action} while request is {state}")]
    InvalidTransition { action: String, state: String },

    #[error("Not found: {what}")]
    NotFound { what: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config {
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        ClientError::AccessDenied {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_transition(action: impl Into<String>, state: impl Into<String>) -> Self {
        ClientError::InvalidTransition {
            action: action.into(),
            state: state.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ClientError::NotFound { what: what.into() }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Config { .. } => 1,
            ClientError::Validation { .. } => 2,
            ClientError::Http(_) => 3,
            ClientError::Api { .. } => 4,
            ClientError::Io(_) => 5,
            ClientError::Json(_) => 6,
            ClientError::Unauthenticated => 10,
            ClientError::AccessDenied { .. } => 11,
            ClientError::InvalidTransition { .. } => 12,
            ClientError::NotFound { .. } => 13,
        }
    }
}
