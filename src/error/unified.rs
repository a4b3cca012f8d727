//! Unified error classification and the `{status, data}` payload exposed to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SokoError;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Validation,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Cancelled,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryLater,
    Reauthenticate,
    FixInput,
    CheckConfiguration,
    IncreaseTimeout,
    ContactSupport,
}

/// Cloneable snapshot of an error, shaped as `{status, data}`.
///
/// `status` is absent for failures that never produced a response
/// (transport, parse, validation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub status: Option<u16>,
    pub data: Value,
}

impl ErrorInfo {
    pub fn new(status: Option<u16>, data: Value) -> Self {
        Self { status, data }
    }
}

impl From<&SokoError> for ErrorInfo {
    fn from(error: &SokoError) -> Self {
        match error {
            SokoError::Api { status, data } => Self::new(Some(*status), data.clone()),
            SokoError::Validation(errors) => Self::new(
                None,
                serde_json::to_value(errors).unwrap_or(Value::Null),
            ),
            other => Self::new(other.status(), Value::String(other.to_string())),
        }
    }
}
