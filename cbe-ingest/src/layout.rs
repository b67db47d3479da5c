//! Page layout: positioned text fragments grouped into visual rows.
//!
//! Receipt PDFs draw labels and values as separate text objects, so one
//! visual line is usually several fragments sharing a baseline:
//!
//!   y=700  "Payer" @x=50      "ABEBE KEBEDE" @x=200   -> "PayerABEBE KEBEDE"
//!   y=680  "Account" @x=50    "1****1234" @x=200      -> "Account1****1234"

use lopdf::Object;
use lopdf::content::Content;

use crate::rows::{RawRow, TextFragment};

/// Baselines closer than this (in user-space units) belong to the same row.
pub const ROW_TOLERANCE: f64 = 1.0;

/// A shown string with the user-space origin it was drawn at.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFragment {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

impl PlacedFragment {
    pub fn new(x: f64, y: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

/// Group fragments into rows, top to bottom, each row ordered left to right.
///
/// Fragments at the same position keep content-stream order.
pub fn group_rows(mut fragments: Vec<PlacedFragment>) -> Vec<RawRow> {
    fragments.retain(|f| !f.text.is_empty());
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut rows: Vec<Vec<PlacedFragment>> = Vec::new();
    let mut anchor = f64::NAN;
    for frag in fragments {
        match rows.last_mut() {
            Some(row) if (anchor - frag.y).abs() <= ROW_TOLERANCE => row.push(frag),
            _ => {
                anchor = frag.y;
                rows.push(vec![frag]);
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            RawRow::new(row.into_iter().map(|f| TextFragment::new(f.text)).collect())
        })
        .collect()
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m × n` in PDF's row-vector convention.
fn mul(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

/// Bytes of a PDF string as text: UTF-16BE when it carries a BOM, one char per
/// byte otherwise.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Text of a `Tj`/`'`/`"` string operand or a `TJ` array. Kerning numbers in
/// arrays are dropped.
fn shown_text(obj: &Object) -> String {
    match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        Object::Array(items) => items.iter().map(shown_text).collect(),
        _ => String::new(),
    }
}

/// Text and graphics state needed to place shown strings.
struct TextCursor {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
    placed: Vec<PlacedFragment>,
}

impl TextCursor {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            saved: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
            placed: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = mul(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, operand: Option<&Object>) {
        let Some(obj) = operand else { return };
        let text = shown_text(obj);
        if text.is_empty() {
            return;
        }
        let trm = mul(&self.tm, &self.ctm);
        self.placed.push(PlacedFragment::new(trm[4], trm[5], text));
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.ctm = mul(&m, &self.ctm);
                }
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "TL" => {
                if let Some([tl]) = numbers::<1>(operands) {
                    self.leading = tl;
                }
            }
            "T*" => self.next_line(),
            "Tj" | "TJ" => self.show(operands.first()),
            "'" => {
                self.next_line();
                self.show(operands.first());
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2));
            }
            _ => {}
        }
    }
}

/// Every string shown by a decoded content stream, placed in user space.
pub fn place_fragments(content: &Content) -> Vec<PlacedFragment> {
    let mut cursor = TextCursor::new();
    for op in &content.operations {
        cursor.apply(&op.operator, &op.operands);
    }
    cursor.placed
}
