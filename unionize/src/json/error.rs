//! Error types for the union JSON codec.

use core::fmt::{self, Display};

use serde_json::Value;

/// Error decoding a union from JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    /// Union being decoded
    pub union: &'static str,
    /// What went wrong
    pub kind: DecodeErrorKind,
}

/// Specific decode failures.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeErrorKind {
    /// The document does not have the envelope shape of the selected mode
    MalformedEnvelope {
        /// Shape that was expected
        expected: &'static str,
        /// What was found instead
        got: String,
    },
    /// The tag names no variant
    UnknownTag {
        /// The tag as read
        tag: String,
    },
    /// The payload does not decode as the variant's payload type
    PayloadTypeMismatch {
        /// Variant whose payload failed
        variant: &'static str,
        /// Underlying error
        message: String,
    },
}

impl DecodeErrorKind {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            DecodeErrorKind::MalformedEnvelope { .. } => "union::malformed_envelope",
            DecodeErrorKind::UnknownTag { .. } => "union::unknown_tag",
            DecodeErrorKind::PayloadTypeMismatch { .. } => "union::payload_type_mismatch",
        }
    }
}

impl Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::MalformedEnvelope { expected, got } => {
                write!(f, "malformed envelope: expected {expected}, got {got}")
            }
            DecodeErrorKind::UnknownTag { tag } => write!(f, "unknown tag `{tag}`"),
            DecodeErrorKind::PayloadTypeMismatch { variant, message } => {
                write!(f, "payload of `{variant}` does not match: {message}")
            }
        }
    }
}

impl DecodeError {
    /// Create an error for `union`.
    pub const fn new(union: &'static str, kind: DecodeErrorKind) -> Self {
        DecodeError { union, kind }
    }

    /// Stable error code of the kind.
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub(crate) fn malformed(union: &'static str, expected: &'static str, got: &Value) -> Self {
        Self::new(
            union,
            DecodeErrorKind::MalformedEnvelope {
                expected,
                got: describe(got),
            },
        )
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.union, self.kind)
    }
}

impl std::error::Error for DecodeError {}

/// Error encoding a union to JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    /// Union being encoded
    pub union: &'static str,
    /// Active variant, when known
    pub variant: Option<&'static str>,
    /// Underlying error
    pub message: String,
}

impl EncodeError {
    /// Stable error code.
    pub const fn code(&self) -> &'static str {
        "union::encode"
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Some(variant) => write!(f, "{}.{}: {}", self.union, variant, self.message),
            None => write!(f, "{}: {}", self.union, self.message),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Short description of a JSON value, for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(n) => format!("the number {n}"),
        Value::String(s) => format!("the string {s:?}"),
        Value::Array(items) => format!("an array of {} elements", items.len()),
        Value::Object(map) => format!("an object with {} keys", map.len()),
    }
}
