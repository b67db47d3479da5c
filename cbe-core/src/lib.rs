//! cbe-core: domain types, error taxonomy and reconciliation for CBE receipt verification

pub mod error;
pub mod receipt;
pub mod reconcile;

pub use error::{ErrorCategory, VerifyError};
pub use receipt::{
    ClaimedTransaction, FieldMismatch, FieldValue, MismatchField, Mismatches, MissingFields,
    OfficialReceipt, ReceiptField, VerificationOutcome, VERIFICATION_FAILED,
};
pub use reconcile::{reconcile, round2, Reconciliation};
