//! Reconciliation: compare a caller's claim against the official receipt.
//!
//! Both checks always run so every disagreement surfaces in one pass.

use crate::receipt::{
    ClaimedTransaction, FieldMismatch, FieldValue, MismatchField, Mismatches, OfficialReceipt,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub ok: bool,
    pub mismatches: Mismatches,
}

/// Round to two decimals, half away from zero.
///
/// Only correct for non-negative input: amounts reaching this point have
/// already been validated as strictly positive.
pub fn round2(val: f64) -> f64 {
    (val * 100.0 + 0.5).trunc() / 100.0
}

pub fn reconcile(claim: &ClaimedTransaction, official: &OfficialReceipt) -> Reconciliation {
    let mut mismatches = Mismatches::new();

    let provided_ref = claim.reference().trim().to_string();
    let official_ref = official.reference.trim().to_string();
    if provided_ref != official_ref {
        mismatches.insert(
            MismatchField::Reference,
            FieldMismatch {
                provided: FieldValue::Text(provided_ref),
                official: FieldValue::Text(official_ref),
            },
        );
    }

    if round2(claim.amount) != round2(official.amount) {
        mismatches.insert(
            MismatchField::Amount,
            FieldMismatch {
                provided: FieldValue::Amount(claim.amount),
                official: FieldValue::Amount(official.amount),
            },
        );
    }

    Reconciliation {
        ok: mismatches.is_empty(),
        mismatches,
    }
}
