//! Unified error handling system
//!
//! Provides structured error types with context and recovery suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PanelResult<T> = Result<T, PanelError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Coarse error classification shared by every component.
///
/// Component-specific errors map onto one of these so the HTTP layer can
/// pick a response without knowing each component's error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Empty identifiers, malformed hex, invalid role
    InvalidInput,
    /// No such session or lock
    NotFound,
    /// Resource already locked by another owner
    Conflict,
    /// Fingerprint mismatch; handled like expiry
    SecurityViolation,
    /// Backing document could not be opened, read or written
    StorageFailure,
    /// Secure randomness unavailable or another unexpected fault
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::SecurityViolation => write!(f, "security_violation"),
            ErrorKind::StorageFailure => write!(f, "storage_failure"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Main error type for panelguard infrastructure
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl PanelError {
    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            PanelError::Config { context, .. } => context,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanelError::Config { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Build a [`PanelError::Config`] for a setting that fails validation
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $suggestion:expr) => {
        $crate::PanelError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion($suggestion),
        }
    };
}
