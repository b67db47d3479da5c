//! Structural errors: everything that stops reconciliation from running.
//!
//! A claim that reconciles but disagrees with the official record is not an
//! error; it is a [`VerificationOutcome`](crate::VerificationOutcome) carrying
//! a mismatch map.

use thiserror::Error;

use crate::receipt::MissingFields;

/// Broad class of a [`VerifyError`], for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input, reported before any I/O.
    InvalidInput,
    /// Connection failure, timeout, or a response that is not a PDF.
    Transport,
    /// The document could not be opened.
    Decode,
    /// The document opened but required receipt fields were not found.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerifyError {
    #[error("invalid transaction ID")]
    InvalidReference,

    #[error("invalid suffix")]
    InvalidSuffix,

    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("network error while requesting CBE receipt: {0}")]
    Network(String),

    #[error("invalid PDF response from CBE (status {status}, content-type {content_type:?})")]
    UnexpectedResponse { status: u16, content_type: String },

    #[error("could not read PDF content: {0}")]
    ResponseBody(String),

    #[error("invalid PDF format: {0}")]
    InvalidPdf(String),

    #[error("failed to open PDF: {0}")]
    Decode(String),

    #[error("missing one or more required fields: {}", .0.missing_names().join(", "))]
    Incomplete(MissingFields),
}

impl VerifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            VerifyError::InvalidReference
            | VerifyError::InvalidSuffix
            | VerifyError::InvalidAmount(_) => ErrorCategory::InvalidInput,
            VerifyError::Network(_)
            | VerifyError::UnexpectedResponse { .. }
            | VerifyError::ResponseBody(_) => ErrorCategory::Transport,
            VerifyError::InvalidPdf(_) | VerifyError::Decode(_) => ErrorCategory::Decode,
            VerifyError::Incomplete(_) => ErrorCategory::Incomplete,
        }
    }

    /// Missing-field diagnostics, present only for [`ErrorCategory::Incomplete`].
    pub fn missing_fields(&self) -> Option<&MissingFields> {
        match self {
            VerifyError::Incomplete(missing) => Some(missing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::ReceiptField;

    #[test]
    fn test_categories() {
        assert_eq!(VerifyError::InvalidSuffix.category(), ErrorCategory::InvalidInput);
        assert_eq!(VerifyError::InvalidAmount(0.0).category(), ErrorCategory::InvalidInput);
        assert_eq!(
            VerifyError::UnexpectedResponse { status: 404, content_type: "text/html".into() }.category(),
            ErrorCategory::Transport
        );
        assert_eq!(VerifyError::Decode("eof".into()).category(), ErrorCategory::Decode);
    }

    #[test]
    fn test_incomplete_message_lists_missing_fields() {
        let mut missing = MissingFields::all_present();
        missing.mark(ReceiptField::ReceiverAccount, true);
        missing.mark(ReceiptField::Amount, true);

        let err = VerifyError::Incomplete(missing);
        assert_eq!(err.category(), ErrorCategory::Incomplete);
        assert_eq!(
            err.to_string(),
            "missing one or more required fields: receiverAccount, amount"
        );
        assert!(err.missing_fields().is_some());
    }
}
