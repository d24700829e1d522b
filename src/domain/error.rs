//! Errors raised by the packaging model.

use thiserror::Error;

/// Violations reported by boxes and pallets.
///
/// Every constructor and derived computation in [`crate::domain::packaging`]
/// reports failures through this type instead of clamping values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackagingError {
    /// An attribute violates its bound at construction time.
    #[error("{field} out of range: {reason}")]
    OutOfRange { field: String, reason: String },

    /// A derived computation produced an infinite or NaN value.
    #[error("overflow while computing {context}")]
    Overflow { context: String },

    /// A required argument was absent.
    #[error("missing argument: {argument}")]
    NullArgument { argument: String },

    /// The object cannot perform the operation in its current state.
    #[error("invalid state: {message}")]
    InvalidState { message: String },
}

impl PackagingError {
    pub fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn overflow(context: &str) -> Self {
        Self::Overflow {
            context: context.to_string(),
        }
    }

    pub fn null_argument(argument: &str) -> Self {
        Self::NullArgument {
            argument: argument.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::Overflow { .. } => "overflow",
            Self::NullArgument { .. } => "null_argument",
            Self::InvalidState { .. } => "invalid_state",
        }
    }
}

pub type PackagingResult<T> = std::result::Result<T, PackagingError>;
