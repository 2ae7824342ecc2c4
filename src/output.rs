//! Output types: reconstructed content units and the per-document aggregate.
//!
//! A [`ContentUnit`] is one reconstructed element — a prose paragraph or a
//! markdown-rendered table. Units are created by the page extractor, stamped
//! with an emission order by the reader, and never mutated afterwards.
//! Downstream consumers serialise them through [`ContentRecord`], the
//! external `{page, kind, text}` shape written to TSV/JSON files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat file-level metadata (title, author, producer, …) copied verbatim
/// from the source document.
pub type DocumentMetadata = BTreeMap<String, String>;

/// What a [`ContentUnit`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Free prose, one reconstructed paragraph.
    Text,
    /// Markdown table source (header line, separator line, data lines).
    Table,
}

/// One reconstructed content element from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentUnit {
    /// 1-based source page number. True page numbering even when iteration
    /// stops before the end of the document.
    pub page: usize,

    /// Prose paragraph or markdown table.
    pub kind: UnitKind,

    /// The unit's text: prose for [`UnitKind::Text`], markdown table source
    /// for [`UnitKind::Table`].
    pub content: String,

    /// Emission order within the document stream, assigned by the reader.
    /// Within a page, all text units precede all table units.
    pub order_hint: Option<usize>,

    /// The page's cleaned pre-segmentation text, retained only when the
    /// reader's inspect mode is enabled.
    pub raw_source: Option<String>,
}

impl ContentUnit {
    /// The externally consumed `{page, kind, text}` shape.
    pub fn record(&self) -> ContentRecord {
        ContentRecord {
            page: self.page,
            kind: self.kind,
            text: self.content.clone(),
        }
    }
}

/// Serialised form of a [`ContentUnit`] for TSV/JSON output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub page: usize,
    pub kind: UnitKind,
    pub text: String,
}

/// Aggregate extraction result for one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractionResult {
    /// All surviving units in emission order.
    pub units: Vec<ContentUnit>,

    /// Pages actually read (capped by the reader's page limit).
    pub num_pages: usize,

    /// Text units yielded across the document.
    pub num_paragraphs: usize,

    /// Table units yielded across the document.
    pub num_tables: usize,

    /// File-level metadata from the source.
    pub metadata: DocumentMetadata,
}

impl DocumentExtractionResult {
    /// True when no unit survived extraction — typically an image-only
    /// scanned document. Not an error; callers decide how to record it.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Assemble the LLM context: unit texts joined by blank lines.
    pub fn context(&self) -> String {
        self.units
            .iter()
            .map(|u| u.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
