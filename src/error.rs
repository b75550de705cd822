use crate::auth::AuthError;
use crate::catalog::form::FieldErrors;
use thiserror::Error;

/// Message key shown when the book list cannot be loaded.
pub const BOOKS_ERROR_LOADING: &str = "books.errorLoading";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request was superseded or the controller shut down.
    #[error("Request cancelled")]
    Cancelled,

    /// Resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body text (may be empty).
        message: String,
    },

    /// Network or protocol failure before a status was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication or registration failure.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Form submission blocked by validation errors.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether this error only signals that a request was superseded.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }

    /// Display-ready message key for list views.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::Auth(e) => e.message_key(),
            _ => BOOKS_ERROR_LOADING,
        }
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
