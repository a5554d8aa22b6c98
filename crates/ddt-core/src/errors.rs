//! Structured error types shared across DDT crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`DdtError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the DDT experiment engine.
///
/// Variants map one-to-one onto the failure families the orchestration layer
/// must distinguish: configuration problems are fatal and never retried,
/// invalid session state is recoverable by restarting the trial exchange,
/// expiry and not-found are surfaced separately so the caller starts a fresh
/// session instead of retrying blindly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum DdtError {
    /// Malformed or empty grids, or a (design, response) pair the parameter
    /// grid cannot explain. Fatal for the session.
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// A request that violates the pending-design protocol or carries
    /// out-of-range trial inputs. The trial log is left untouched.
    #[error("invalid session state: {0}")]
    InvalidState(ErrorInfo),
    /// The session outlived its TTL and must be restarted.
    #[error("session expired: {0}")]
    Expired(ErrorInfo),
    /// No persisted state exists for the requested session.
    #[error("session not found: {0}")]
    NotFound(ErrorInfo),
    /// The subject identifier range is exhausted.
    #[error("allocation exhausted: {0}")]
    Allocation(ErrorInfo),
    /// Snapshot or record serialization failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl DdtError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            DdtError::Configuration(info)
            | DdtError::InvalidState(info)
            | DdtError::Expired(info)
            | DdtError::NotFound(info)
            | DdtError::Allocation(info)
            | DdtError::Serde(info) => info,
        }
    }
}
