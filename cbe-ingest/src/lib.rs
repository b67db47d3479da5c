//! cbe-ingest: turns receipt PDF text rows into a validated official receipt.

pub mod rows;
pub mod normalize;
pub mod extract;
pub mod validate;
pub mod layout;
pub mod pdf;

pub use rows::{PageRows, RawRow, TextFragment};
pub use normalize::{normalize, split_merged_words};
pub use extract::{extract, ActiveEntity, ExtractionContext, LineMatch, LineRule, ReceiptDraft};
pub use layout::{group_rows, PlacedFragment};
pub use validate::{finalize, validate, Validation};
pub use pdf::{parse_receipt, LopdfDecoder, RowDecoder};
