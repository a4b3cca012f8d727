//! Error types for Soko.

pub mod unified;

pub use unified::{ErrorCategory, ErrorInfo, RecoverySuggestion};

use serde_json::Value;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Primary error type for all Soko operations.
#[derive(Error, Debug)]
pub enum SokoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server answered with a non-2xx status. `data` is the decoded body
    /// (JSON when possible, otherwise the raw text as a string).
    #[error("API error (status {status}): {}", summarize(.data))]
    Api { status: u16, data: Value },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SokoError {
    /// Create an API error from a status code and decoded body.
    pub fn api(status: u16, data: impl Into<Value>) -> Self {
        Self::Api {
            status,
            data: data.into(),
        }
    }

    /// HTTP status, when the error came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server rejected the request as unauthenticated.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Network(err) if err.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                400 | 422 => ErrorCategory::Validation,
                408 => ErrorCategory::Timeout,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::Reauthenticate,
            ErrorCategory::Validation => RecoverySuggestion::FixInput,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::RetryLater,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::ContactSupport,
        }
    }

    /// Short text suitable for a transient user-visible notification.
    ///
    /// Prefers the server's own `error` / `detail` message over the generic
    /// error rendering.
    pub fn display_message(&self) -> String {
        match self {
            Self::Api { data, .. } => server_message(data)
                .unwrap_or_else(|| "The request failed. Please try again.".to_string()),
            Self::Validation(errors) => errors.to_string(),
            Self::Network(_) => "Unable to reach the server.".to_string(),
            other => other.to_string(),
        }
    }
}

fn server_message(data: &Value) -> Option<String> {
    match data {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(map) => ["error", "detail", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn summarize(data: &Value) -> String {
    server_message(data).unwrap_or_else(|| data.to_string())
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SokoError>;
