//! Receipt, claim and outcome types shared by extraction, reconciliation and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::VerifyError;

/// Message attached to an outcome whose claim reconciled but disagreed.
pub const VERIFICATION_FAILED: &str = "transaction verification failed";

/// A transaction as claimed by the caller. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimedTransaction {
    /// Transaction reference, e.g. `FT23xxxxxxxx`
    pub id: String,
    /// Suffix appended to the reference when requesting the receipt
    pub suffix: String,
    /// Claimed amount in ETB
    pub amount: f64,
}

impl ClaimedTransaction {
    pub fn new(id: impl Into<String>, suffix: impl Into<String>, amount: f64) -> Self {
        Self {
            id: id.into(),
            suffix: suffix.into(),
            amount,
        }
    }

    /// Full reference: id and suffix concatenated with no separator.
    pub fn reference(&self) -> String {
        format!("{}{}", self.id, self.suffix)
    }

    /// Input checks that must pass before any network activity.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.id.trim().is_empty() {
            return Err(VerifyError::InvalidReference);
        }
        if self.suffix.trim().is_empty() {
            return Err(VerifyError::InvalidSuffix);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(VerifyError::InvalidAmount(self.amount));
        }
        Ok(())
    }
}

/// Receipt data extracted from the authoritative PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialReceipt {
    pub payer: String,
    /// First account seen while the payer was the active entity
    pub payer_account: String,
    pub receiver: String,
    /// First account seen while the receiver was the active entity
    pub receiver_account: String,
    /// Transferred amount in ETB
    pub amount: f64,
    /// Payment date exactly as printed (`D/M/YYYY[, H:MM:SS AM]`)
    pub date: String,
    pub reference: String,
    pub reason: String,
}

/// Fields checked by the validator, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptField {
    Payer,
    Receiver,
    PayerAccount,
    ReceiverAccount,
    Reference,
    PaymentDate,
    Amount,
}

impl ReceiptField {
    pub const ALL: [ReceiptField; 7] = [
        ReceiptField::Payer,
        ReceiptField::Receiver,
        ReceiptField::PayerAccount,
        ReceiptField::ReceiverAccount,
        ReceiptField::Reference,
        ReceiptField::PaymentDate,
        ReceiptField::Amount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptField::Payer => "payer",
            ReceiptField::Receiver => "receiver",
            ReceiptField::PayerAccount => "payerAccount",
            ReceiptField::ReceiverAccount => "receiverAccount",
            ReceiptField::Reference => "reference",
            ReceiptField::PaymentDate => "paymentDate",
            ReceiptField::Amount => "amount",
        }
    }
}

impl fmt::Display for ReceiptField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field missing flags. Always holds an entry for every [`ReceiptField`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFields(BTreeMap<ReceiptField, bool>);

impl MissingFields {
    pub fn all_present() -> Self {
        Self(ReceiptField::ALL.iter().map(|f| (*f, false)).collect())
    }

    pub fn mark(&mut self, field: ReceiptField, missing: bool) {
        self.0.insert(field, missing);
    }

    pub fn is_missing(&self, field: ReceiptField) -> bool {
        self.0.get(&field).copied().unwrap_or(true)
    }

    pub fn is_complete(&self) -> bool {
        !self.0.values().any(|m| *m)
    }

    pub fn missing(&self) -> impl Iterator<Item = ReceiptField> + '_ {
        self.0.iter().filter(|(_, m)| **m).map(|(f, _)| *f)
    }

    pub fn missing_names(&self) -> Vec<&'static str> {
        self.missing().map(|f| f.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReceiptField, bool)> + '_ {
        self.0.iter().map(|(f, m)| (*f, *m))
    }
}

/// Fields the reconciliation comparator checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchField {
    Reference,
    Amount,
}

impl fmt::Display for MismatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchField::Reference => f.write_str("reference"),
            MismatchField::Amount => f.write_str("amount"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s:?}"),
            FieldValue::Amount(a) => write!(f, "{a:.2}"),
        }
    }
}

/// Claimed vs. official value for one disagreeing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub provided: FieldValue,
    pub official: FieldValue,
}

pub type Mismatches = BTreeMap<MismatchField, FieldMismatch>;

/// Result of one verification call.
///
/// Only three shapes exist: verified (no error, no mismatches), mismatched
/// (generic error plus a non-empty mismatch map) and structural (error, plus
/// the per-field flags when the receipt was incomplete).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<OfficialReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mismatches: Option<Mismatches>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<MissingFields>,
}

impl VerificationOutcome {
    /// `details` is `Some` only when the caller asked for them.
    pub fn verified(details: Option<OfficialReceipt>) -> Self {
        Self {
            is_valid: true,
            details,
            error: None,
            mismatches: None,
            missing_fields: None,
        }
    }

    /// Falls back to a structural outcome if handed an empty map.
    pub fn mismatched(mismatches: Mismatches) -> Self {
        if mismatches.is_empty() {
            return Self::structural(VERIFICATION_FAILED);
        }
        Self {
            is_valid: false,
            details: None,
            error: Some(VERIFICATION_FAILED.to_string()),
            mismatches: Some(mismatches),
            missing_fields: None,
        }
    }

    pub fn structural(error: impl fmt::Display) -> Self {
        Self {
            is_valid: false,
            details: None,
            error: Some(error.to_string()),
            mismatches: None,
            missing_fields: None,
        }
    }

    /// Structural outcome for a pipeline error. An incomplete receipt keeps
    /// its full missing-field map.
    pub fn failed(err: VerifyError) -> Self {
        let missing_fields = err.missing_fields().cloned();
        Self {
            missing_fields,
            ..Self::structural(err)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn details(&self) -> Option<&OfficialReceipt> {
        self.details.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn mismatches(&self) -> Option<&Mismatches> {
        self.mismatches.as_ref()
    }

    pub fn missing_fields(&self) -> Option<&MissingFields> {
        self.missing_fields.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> OfficialReceipt {
        OfficialReceipt {
            payer: "ABEBE KEBEDE".into(),
            payer_account: "1****1234".into(),
            receiver: "TIGIST ALEMU".into(),
            receiver_account: "1****5678".into(),
            amount: 500.0,
            date: "3/14/2024, 10:21:05 AM".into(),
            reference: "FT24074ABCDE".into(),
            reason: "Rent".into(),
        }
    }

    #[test]
    fn test_claim_reference_concatenates_without_separator() {
        let claim = ClaimedTransaction::new("FT24074ABCDE", "12345678", 10.0);
        assert_eq!(claim.reference(), "FT24074ABCDE12345678");
    }

    #[test]
    fn test_claim_validation() {
        assert_eq!(
            ClaimedTransaction::new("  ", "1234", 10.0).validate(),
            Err(VerifyError::InvalidReference)
        );
        assert_eq!(
            ClaimedTransaction::new("FT1", "\t", 10.0).validate(),
            Err(VerifyError::InvalidSuffix)
        );
        assert_eq!(
            ClaimedTransaction::new("FT1", "1234", 0.0).validate(),
            Err(VerifyError::InvalidAmount(0.0))
        );
        assert!(ClaimedTransaction::new("FT1", "1234", -3.0).validate().is_err());
        assert!(ClaimedTransaction::new("FT1", "1234", f64::NAN).validate().is_err());
        assert!(ClaimedTransaction::new("FT1", "1234", 0.01).validate().is_ok());
    }

    #[test]
    fn test_missing_fields_reports_every_field() {
        let mut missing = MissingFields::all_present();
        assert!(missing.is_complete());
        assert_eq!(missing.iter().count(), ReceiptField::ALL.len());

        missing.mark(ReceiptField::PaymentDate, true);
        assert!(!missing.is_complete());
        assert!(missing.is_missing(ReceiptField::PaymentDate));
        assert!(!missing.is_missing(ReceiptField::Payer));
        assert_eq!(missing.missing_names(), vec!["paymentDate"]);
    }

    #[test]
    fn test_missing_fields_json_keys() {
        let mut missing = MissingFields::all_present();
        missing.mark(ReceiptField::ReceiverAccount, true);
        let v = serde_json::to_value(&missing).unwrap();
        assert_eq!(v["receiverAccount"], serde_json::json!(true));
        assert_eq!(v["payerAccount"], serde_json::json!(false));
        assert_eq!(v["amount"], serde_json::json!(false));
    }

    #[test]
    fn test_outcome_shapes() {
        let ok = VerificationOutcome::verified(Some(receipt()));
        assert!(ok.is_valid());
        assert!(ok.error().is_none());
        assert!(ok.mismatches().is_none());
        assert_eq!(ok.details().map(|d| d.amount), Some(500.0));

        let structural = VerificationOutcome::structural(VerifyError::InvalidSuffix);
        assert!(!structural.is_valid());
        assert_eq!(structural.error(), Some("invalid suffix"));
        assert!(structural.mismatches().is_none());

        // An empty mismatch map never yields an invalid outcome without a reason.
        let empty = VerificationOutcome::mismatched(Mismatches::new());
        assert!(!empty.is_valid());
        assert!(empty.error().is_some());
        assert!(empty.mismatches().is_none());
    }

    #[test]
    fn test_outcome_json_omits_absent_parts() {
        let mut mismatches = Mismatches::new();
        mismatches.insert(
            MismatchField::Amount,
            FieldMismatch {
                provided: FieldValue::Amount(499.99),
                official: FieldValue::Amount(500.0),
            },
        );
        let v = serde_json::to_value(VerificationOutcome::mismatched(mismatches)).unwrap();
        assert_eq!(v["is_valid"], serde_json::json!(false));
        assert_eq!(v["error"], serde_json::json!(VERIFICATION_FAILED));
        assert_eq!(v["mismatches"]["amount"]["provided"], serde_json::json!(499.99));
        assert!(v.get("details").is_none());

        let v = serde_json::to_value(VerificationOutcome::verified(None)).unwrap();
        assert_eq!(v, serde_json::json!({ "is_valid": true }));
    }

    #[test]
    fn test_failed_outcome_keeps_missing_field_map() {
        let mut missing = MissingFields::all_present();
        missing.mark(ReceiptField::ReceiverAccount, true);
        let outcome = VerificationOutcome::failed(VerifyError::Incomplete(missing.clone()));

        assert!(!outcome.is_valid());
        assert_eq!(
            outcome.error(),
            Some("missing one or more required fields: receiverAccount")
        );
        assert_eq!(outcome.missing_fields(), Some(&missing));

        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["missing_fields"]["receiverAccount"], serde_json::json!(true));
        assert_eq!(v["missing_fields"]["payer"], serde_json::json!(false));
        assert_eq!(v["missing_fields"].as_object().unwrap().len(), ReceiptField::ALL.len());

        let network = VerificationOutcome::failed(VerifyError::Network("refused".into()));
        assert!(network.missing_fields().is_none());
        assert!(serde_json::to_value(&network).unwrap().get("missing_fields").is_none());
    }
}
