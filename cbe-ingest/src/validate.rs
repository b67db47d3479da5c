//! Required-field checks on an extracted draft.

use cbe_core::{MissingFields, OfficialReceipt, ReceiptField};

use crate::extract::ReceiptDraft;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    /// Every required field plus amount, flagged whether or not the draft is valid
    pub missing: MissingFields,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

pub fn validate(draft: &ReceiptDraft) -> Validation {
    let mut missing = MissingFields::all_present();
    missing.mark(ReceiptField::Payer, !present(&draft.payer));
    missing.mark(ReceiptField::Receiver, !present(&draft.receiver));
    missing.mark(ReceiptField::PayerAccount, !present(&draft.payer_account));
    missing.mark(ReceiptField::ReceiverAccount, !present(&draft.receiver_account));
    missing.mark(ReceiptField::Reference, !present(&draft.reference));
    missing.mark(ReceiptField::PaymentDate, !present(&draft.date));
    let amount_ok = draft.amount > 0.0;
    missing.mark(ReceiptField::Amount, !amount_ok);

    Validation {
        valid: missing.is_complete(),
        missing,
    }
}

/// Validate a draft and turn it into the official record.
pub fn finalize(draft: ReceiptDraft) -> Result<OfficialReceipt, MissingFields> {
    let validation = validate(&draft);
    if !validation.valid {
        return Err(validation.missing);
    }

    Ok(OfficialReceipt {
        payer: draft.payer.unwrap_or_default(),
        payer_account: draft.payer_account.unwrap_or_default(),
        receiver: draft.receiver.unwrap_or_default(),
        receiver_account: draft.receiver_account.unwrap_or_default(),
        amount: draft.amount,
        date: draft.date.unwrap_or_default(),
        reference: draft.reference.unwrap_or_default(),
        reason: draft.reason.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> ReceiptDraft {
        ReceiptDraft {
            payer: Some("ABEBE KEBEDE".into()),
            payer_account: Some("1****1234".into()),
            receiver: Some("TIGIST ALEMU".into()),
            receiver_account: Some("1****5678".into()),
            amount: 500.0,
            date: Some("3/14/2024, 10:21:05 AM".into()),
            reference: Some("FT24074ABCDE".into()),
            reason: None,
        }
    }

    #[test]
    fn test_complete_draft_is_valid() {
        let v = validate(&complete_draft());
        assert!(v.valid);
        assert!(v.missing.is_complete());
        assert_eq!(v.missing.iter().count(), ReceiptField::ALL.len());
    }

    #[test]
    fn test_missing_receiver_account_only() {
        let mut draft = complete_draft();
        draft.receiver_account = None;

        let v = validate(&draft);
        assert!(!v.valid);
        for (field, missing) in v.missing.iter() {
            assert_eq!(missing, field == ReceiptField::ReceiverAccount, "field {field}");
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut draft = complete_draft();
        draft.payer = Some(String::new());
        assert!(validate(&draft).missing.is_missing(ReceiptField::Payer));
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut draft = complete_draft();
        draft.amount = 0.0;
        let v = validate(&draft);
        assert!(!v.valid);
        assert!(v.missing.is_missing(ReceiptField::Amount));
        assert_eq!(v.missing.missing_names(), vec!["amount"]);
    }

    #[test]
    fn test_reason_is_optional() {
        let receipt = finalize(complete_draft()).unwrap();
        assert_eq!(receipt.reason, "");
        assert_eq!(receipt.reference, "FT24074ABCDE");
        assert_eq!(receipt.amount, 500.0);
    }

    #[test]
    fn test_finalize_returns_missing_map() {
        let missing = finalize(ReceiptDraft::default()).unwrap_err();
        assert_eq!(missing.missing().count(), ReceiptField::ALL.len());
    }
}
