//! Terminal rendering for verification and parse results.

use anyhow::{Context, Result};
use cbe_core::{MissingFields, VerificationOutcome};
use cbe_ingest::ReceiptDraft;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

pub fn print_outcome(outcome: &VerificationOutcome) {
    if outcome.is_valid() {
        println!("Transaction verified successfully.");
        if let Some(d) = outcome.details() {
            println!("Amount: {:.2} ETB", d.amount);
            println!("Payer: {} ({})", d.payer, d.payer_account);
            println!("Receiver: {} ({})", d.receiver, d.receiver_account);
            println!("Date: {}", d.date);
            println!("Reference: {}", d.reference);
            if !d.reason.is_empty() {
                println!("Reason: {}", d.reason);
            }
        }
        return;
    }

    println!(
        "Verification failed: {}",
        outcome.error().unwrap_or("unknown error")
    );
    if let Some(mismatches) = outcome.mismatches() {
        println!("Mismatches:");
        for (field, m) in mismatches {
            println!("  - {field}: provided {}, official {}", m.provided, m.official);
        }
    }
    if let Some(missing) = outcome.missing_fields() {
        println!("Missing fields:");
        for field in missing.missing() {
            println!("  - {field}");
        }
    }
}

#[derive(Serialize)]
pub struct ParseReport<'a> {
    pub valid: bool,
    pub receipt: &'a ReceiptDraft,
    pub missing: &'a MissingFields,
}

pub fn print_parse_report(report: &ParseReport<'_>) {
    let d = report.receipt;
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    println!("Payer: {} ({})", show(&d.payer), show(&d.payer_account));
    println!("Receiver: {} ({})", show(&d.receiver), show(&d.receiver_account));
    println!("Amount: {:.2} ETB", d.amount);
    println!("Date: {}", show(&d.date));
    println!("Reference: {}", show(&d.reference));
    println!("Reason: {}", show(&d.reason));

    if report.valid {
        println!("\nReceipt is complete.");
    } else {
        println!("\nMissing required fields:");
        for field in report.missing.missing() {
            println!("  - {field}");
        }
    }
}
