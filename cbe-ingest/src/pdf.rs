//! Decoding collaborator: PDF bytes to pages of text rows.

use cbe_core::{OfficialReceipt, VerifyError};
use lopdf::content::Content;
use lopdf::{Document, ObjectId};
use tracing::{debug, warn};

use crate::extract::extract;
use crate::layout::{group_rows, place_fragments};
use crate::rows::{PageRows, RawRow};
use crate::validate::finalize;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Turns document bytes into ordered pages of rows.
///
/// A document that cannot be opened (or has no pages) is an error; a single
/// page that cannot be read is skipped.
pub trait RowDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<PageRows>, VerifyError>;
}

/// [`RowDecoder`] backed by `lopdf`. Each page's content stream is walked to
/// place every shown string, and strings sharing a baseline form one row.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfDecoder;

impl LopdfDecoder {
    fn page_rows(doc: &Document, page_id: ObjectId) -> Result<Vec<RawRow>, lopdf::Error> {
        let content = Content::decode(&doc.get_page_content(page_id)?)?;
        Ok(group_rows(place_fragments(&content)))
    }
}

impl RowDecoder for LopdfDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<PageRows>, VerifyError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(VerifyError::InvalidPdf("missing PDF header".to_string()));
        }

        let doc = Document::load_mem(bytes).map_err(|e| VerifyError::Decode(e.to_string()))?;
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(VerifyError::Decode("document has no pages".to_string()));
        }

        let mut pages = Vec::new();
        for (page_no, page_id) in page_ids {
            match Self::page_rows(&doc, page_id) {
                Ok(rows) => {
                    debug!(page = page_no, rows = rows.len(), "laid out page");
                    pages.push(PageRows::new(page_no, rows));
                }
                Err(err) => warn!(page = page_no, error = %err, "skipping unreadable page"),
            }
        }

        debug!(pages = pages.len(), "decoded receipt document");
        Ok(pages)
    }
}

/// Decode, extract and validate a receipt document.
pub fn parse_receipt<D>(decoder: &D, bytes: &[u8]) -> Result<OfficialReceipt, VerifyError>
where
    D: RowDecoder + ?Sized,
{
    let pages = decoder.decode(bytes)?;
    let draft = extract(&pages);
    finalize(draft).map_err(VerifyError::Incomplete)
}
