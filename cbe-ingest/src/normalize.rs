//! Row normalization ahead of field matching.

use regex::Regex;
use std::sync::OnceLock;

use crate::rows::RawRow;

fn merged_words_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z])([A-Z])").expect("invalid merged words regex"))
}

/// Concatenate a row's fragments and undo PDF word merging.
pub fn normalize(row: &RawRow) -> String {
    split_merged_words(&row.joined())
}

/// Insert a space wherever a lowercase letter is directly followed by an uppercase one.
///
/// Known false positive: genuine CamelCase text (`McDonald`, `eBirr`) is split
/// too. Receipts print labels and names in forms where this is acceptable.
/// No trimming or case change happens here.
pub fn split_merged_words(line: &str) -> String {
    merged_words_re().replace_all(line, "$1 $2").into_owned()
}
