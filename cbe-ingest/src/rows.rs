//! Row model consumed from the PDF decoder: pages of rows of text fragments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    text: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One visual line of a page. Fragment order matters, fragment boundaries do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub fragments: Vec<TextFragment>,
}

impl RawRow {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(TextFragment::new).collect(),
        }
    }

    /// A row made of a single fragment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![TextFragment::new(text)],
        }
    }

    /// Fragments concatenated verbatim, no separator.
    pub fn joined(&self) -> String {
        self.fragments.iter().map(TextFragment::text).collect()
    }
}

/// Rows of one page, in decoder order. `index` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRows {
    pub index: u32,
    pub rows: Vec<RawRow>,
}

impl PageRows {
    pub fn new(index: u32, rows: Vec<RawRow>) -> Self {
        Self { index, rows }
    }

    pub fn from_lines<'a>(index: u32, lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            index,
            rows: lines.into_iter().map(RawRow::from_text).collect(),
        }
    }
}
