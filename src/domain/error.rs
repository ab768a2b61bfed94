use thiserror::Error;

use super::diagram::SyntaxError;

/// Everything a render attempt can fail with.
///
/// The renderer client never panics for expected conditions; each of these is
/// a typed outcome the HTTP boundary maps onto its wire envelope.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("diagram description is empty")]
    EmptyDescription,
    #[error("diagram format `{format}` is not supported")]
    UnknownFormat { format: String },
    #[error("invalid renderer address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("renderer is unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("renderer client error: {reason}")]
    Internal { reason: String },
    #[error("diagram description failed to parse")]
    Syntax { detail: Option<SyntaxError> },
}

impl RenderError {
    pub fn unknown_format(format: impl Into<String>) -> Self {
        Self::UnknownFormat {
            format: format.into(),
        }
    }

    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}
