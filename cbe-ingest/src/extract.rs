//! Field extraction for CBE transfer receipts.
//!
//! Expected normalized rows (one per visual line, labels and values may be
//! merged by the PDF producer before normalization):
//!   Payer                 ABEBE KEBEDE
//!   Account               1****1234
//!   Receiver              TIGIST ALEMU
//!   Account               1****5678
//!   Payment Date & Time   3/14/2024, 10:21:05 AM
//!   Reference No. (VAT Invoice No)  FT24074ABCDE
//!   Reason / Type of service  Rent payment
//!   Transferred Amount    1,500.00 ETB
//!
//! Account rows carry no party label of their own; they belong to whichever
//! party row was seen last.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::trace;

use crate::normalize::normalize;
use crate::rows::PageRows;

/// Party the most recent name row referred to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveEntity {
    #[default]
    None,
    Payer,
    Receiver,
}

/// Line classification rules. A line is assigned to the first rule in
/// [`LineRule::ORDER`] that captures a non-empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRule {
    Payer,
    Receiver,
    Account,
    TransferredAmount,
    Reason,
    Reference,
    PaymentDate,
}

/// A classified line with its captured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    Payer(String),
    Receiver(String),
    Account(String),
    TransferredAmount(String),
    Reason(String),
    Reference(String),
    PaymentDate(String),
}

impl LineRule {
    pub const ORDER: [LineRule; 7] = [
        LineRule::Payer,
        LineRule::Receiver,
        LineRule::Account,
        LineRule::TransferredAmount,
        LineRule::Reason,
        LineRule::Reference,
        LineRule::PaymentDate,
    ];

    fn pattern(self) -> &'static Regex {
        static PAYER: OnceLock<Regex> = OnceLock::new();
        static RECEIVER: OnceLock<Regex> = OnceLock::new();
        static ACCOUNT: OnceLock<Regex> = OnceLock::new();
        static AMOUNT: OnceLock<Regex> = OnceLock::new();
        static REASON: OnceLock<Regex> = OnceLock::new();
        static REFERENCE: OnceLock<Regex> = OnceLock::new();
        static DATE: OnceLock<Regex> = OnceLock::new();

        let (cell, src) = match self {
            LineRule::Payer => (&PAYER, r"(?i)payer\s*:?\s*([\w\s&.\-]+)"),
            LineRule::Receiver => (&RECEIVER, r"(?i)receiver\s*:?\s*([\w\s&.\-]+)"),
            LineRule::Account => (&ACCOUNT, r"(?i)account\s*:?\s*(\S+)"),
            LineRule::TransferredAmount => (
                &AMOUNT,
                r"(?i)transferred amount\s*:?\s*([0-9,]+\.[0-9]{2})\s*ETB",
            ),
            LineRule::Reason => (&REASON, r"(?i)reason\s*:?\s*(.+)"),
            LineRule::Reference => (&REFERENCE, r"(?i)reference no\.?\s*:?\s*(.+)"),
            LineRule::PaymentDate => (
                &DATE,
                concat!(
                    r"(?i)payment date.*?",
                    r"([0-9]{1,2}/[0-9]{1,2}/[0-9]{4}",
                    r"(?:,\s*[0-9]{1,2}:[0-9]{2}:[0-9]{2}\s*(?:AM|PM)?)?)"
                ),
            ),
        };
        cell.get_or_init(|| Regex::new(src).expect("invalid receipt line regex"))
    }

    /// Trimmed first capture group, or `None` when the rule does not match or
    /// captures only whitespace.
    pub fn capture(self, line: &str) -> Option<String> {
        let caps = self.pattern().captures(line)?;
        let value = caps.get(1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    /// Classify one normalized line. First matching rule wins.
    pub fn classify(line: &str) -> Option<LineMatch> {
        Self::ORDER
            .iter()
            .find_map(|rule| rule.capture(line).map(|value| rule.to_match(value)))
    }

    fn to_match(self, value: String) -> LineMatch {
        match self {
            LineRule::Payer => LineMatch::Payer(value),
            LineRule::Receiver => LineMatch::Receiver(value),
            LineRule::Account => LineMatch::Account(value),
            LineRule::TransferredAmount => LineMatch::TransferredAmount(value),
            LineRule::Reason => LineMatch::Reason(clean_reason(&value)),
            LineRule::Reference => LineMatch::Reference(clean_reference(&value)),
            LineRule::PaymentDate => LineMatch::PaymentDate(value),
        }
    }
}

impl LineMatch {
    pub fn rule(&self) -> LineRule {
        match self {
            LineMatch::Payer(_) => LineRule::Payer,
            LineMatch::Receiver(_) => LineRule::Receiver,
            LineMatch::Account(_) => LineRule::Account,
            LineMatch::TransferredAmount(_) => LineRule::TransferredAmount,
            LineMatch::Reason(_) => LineRule::Reason,
            LineMatch::Reference(_) => LineRule::Reference,
            LineMatch::PaymentDate(_) => LineRule::PaymentDate,
        }
    }
}

const SERVICE_MARKER: &str = "Type of service";

/// Reduce a captured reason to the part after its label.
///
/// Text after "Type of service" wins when present; otherwise the text after
/// the rightmost `/` or `:`. A separator in last position keeps the whole text.
pub fn clean_reason(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(idx) = raw.find(SERVICE_MARKER) {
        return raw[idx + SERVICE_MARKER.len()..]
            .trim_start_matches(|c: char| c == '/' || c == ':' || c.is_whitespace())
            .trim()
            .to_string();
    }

    match raw.rfind(|c: char| c == '/' || c == ':') {
        Some(pos) if pos + 1 < raw.len() => raw[pos + 1..].trim().to_string(),
        _ => raw.to_string(),
    }
}

/// Strip a leading `(...)` group such as `(VAT Invoice No)`.
pub fn clean_reference(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('(') {
        if let Some(end) = rest.find(')') {
            return rest[end + 1..].trim().to_string();
        }
    }
    raw.to_string()
}

/// Amount text with thousands separators removed; unparseable text yields 0.
pub fn parse_amount(text: &str) -> f64 {
    text.replace(',', "").trim().parse().unwrap_or(0.0)
}

/// Record produced by one extraction pass, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiptDraft {
    pub payer: Option<String>,
    pub payer_account: Option<String>,
    pub receiver: Option<String>,
    pub receiver_account: Option<String>,
    /// 0 when no amount row was found or it failed to parse
    pub amount: f64,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub reason: Option<String>,
}

/// Scan state for one document. Never shared across documents.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    active: ActiveEntity,
    payer: Option<String>,
    receiver: Option<String>,
    payer_accounts: Vec<String>,
    receiver_accounts: Vec<String>,
    transferred_amount: Option<String>,
    reason: Option<String>,
    reference: Option<String>,
    payment_date: Option<String>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_entity(&self) -> ActiveEntity {
        self.active
    }

    /// Classify a normalized line and fold it into the context.
    pub fn feed_line(&mut self, line: &str) -> Option<LineRule> {
        let m = LineRule::classify(line)?;
        let rule = m.rule();
        trace!(?rule, line = %line, "classified receipt line");
        self.apply(m);
        Some(rule)
    }

    pub fn apply(&mut self, m: LineMatch) {
        match m {
            LineMatch::Payer(name) => {
                self.payer = Some(name);
                self.active = ActiveEntity::Payer;
            }
            LineMatch::Receiver(name) => {
                self.receiver = Some(name);
                self.active = ActiveEntity::Receiver;
            }
            LineMatch::Account(account) => match self.active {
                ActiveEntity::Payer => self.payer_accounts.push(account),
                ActiveEntity::Receiver => self.receiver_accounts.push(account),
                ActiveEntity::None => {
                    trace!(account = %account, "dropping account seen before any party")
                }
            },
            LineMatch::TransferredAmount(text) => self.transferred_amount = Some(text),
            LineMatch::Reason(text) => self.reason = Some(text),
            LineMatch::Reference(text) => self.reference = Some(text),
            LineMatch::PaymentDate(text) => self.payment_date = Some(text),
        }
    }

    pub fn finish(self) -> ReceiptDraft {
        ReceiptDraft {
            payer: self.payer,
            payer_account: self.payer_accounts.into_iter().next(),
            receiver: self.receiver,
            receiver_account: self.receiver_accounts.into_iter().next(),
            amount: self.transferred_amount.as_deref().map(parse_amount).unwrap_or(0.0),
            date: self.payment_date,
            reference: self.reference,
            reason: self.reason,
        }
    }
}

/// Scan pages in ascending index order, rows in decoder order.
pub fn extract(pages: &[PageRows]) -> ReceiptDraft {
    let mut ordered: Vec<&PageRows> = pages.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let mut ctx = ExtractionContext::new();
    for page in ordered {
        for row in &page.rows {
            ctx.feed_line(&normalize(row));
        }
    }
    ctx.finish()
}
