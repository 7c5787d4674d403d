use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error taxonomy shared with the backend. Values match the backend's
/// `ErrorCode` discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ErrorCode {
    Database,
    Network,
    Io,
    Business,
    Serialize,
    Protocol,
    NotFound,
    AlreadyExists,
    Validation,
    Permission,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Database => 0,
            Self::Network => 1,
            Self::Io => 2,
            Self::Business => 3,
            Self::Serialize => 4,
            Self::Protocol => 5,
            Self::NotFound => 6,
            Self::AlreadyExists => 7,
            Self::Validation => 8,
            Self::Permission => 9,
        }
    }

    /// Failures worth another attempt: the same request may succeed once the
    /// network, disk or database recovers. Everything else is a verdict on the
    /// request itself.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::Io | Self::Database)
    }

    /// Generic user-facing text for the code, used when the backend sent none.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Database => "Database operation failed",
            Self::Network => "Network operation failed, check your connection",
            Self::Io => "File read/write failed",
            Self::Business => "Business rule violated",
            Self::Serialize => "Data serialization failed",
            Self::Protocol => "Protocol parsing error",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::Validation => "Input validation failed",
            Self::Permission => "Permission denied",
        }
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Database,
            1 => Self::Network,
            2 => Self::Io,
            3 => Self::Business,
            4 => Self::Serialize,
            5 => Self::Protocol,
            6 => Self::NotFound,
            7 => Self::AlreadyExists,
            8 => Self::Validation,
            9 => Self::Permission,
            other => return Err(format!("unknown error code {other}")),
        })
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> i32 {
        code.as_i32()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structured error as reported by the backend.
///
/// Backend commands reject either with this object (usually JSON-encoded in a
/// string) or with a free-form message. [`FrontendError::parse`] and
/// [`FrontendError::from_value`] accept both shapes so callers only ever deal
/// with one type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FrontendError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Parse an error string: JSON `{code, message, details}` if it is one,
    /// otherwise a `Business` error carrying the raw text.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<FrontendError>(raw) {
            Ok(parsed) => parsed,
            Err(_) => Self::fallback(raw),
        }
    }

    /// Normalise whatever the bridge rejected with.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(raw) => Self::parse(raw),
            Value::Object(_) => serde_json::from_value::<FrontendError>(value.clone())
                .unwrap_or_else(|_| Self::fallback(&value.to_string())),
            Value::Null => Self::fallback(""),
            other => Self::fallback(&other.to_string()),
        }
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    /// The backend message, or the code's default text when it is empty.
    pub fn display_message(&self) -> &str {
        if self.message.is_empty() {
            self.code.default_message()
        } else {
            &self.message
        }
    }

    fn fallback(raw: &str) -> Self {
        let message = if raw.is_empty() { "unknown error" } else { raw };
        Self::new(ErrorCode::Business, message)
    }
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.display_message())
    }
}

/// An integer on the wire did not name any variant of the target enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} discriminant: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: i8,
}
