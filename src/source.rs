//! Capability traits over the upstream PDF extraction primitive.
//!
//! The layout engine needs three things from a PDF library: raw positioned
//! text for a page, the bounding boxes of detected tables, and the cell grid
//! of one table. Everything else (object model, fonts, rendering) is
//! irrelevant here, so the core depends on these three operations only and
//! never on a concrete library's types. Any backend that can answer them —
//! a pdfplumber-style extractor over FFI, a pure-Rust parser, or an
//! in-memory fixture in tests — plugs in behind [`PageContentSource`].
//!
//! The geometric exclusion rule lives in this module as
//! [`BoundingBox::contains_midpoint`]: an element belongs to a table region
//! when its midpoint falls inside the table's box. Backends receive the table
//! boxes through [`LayoutParams::exclude`] and are expected to drop any text
//! element whose midpoint the core would attribute to a table, so table text
//! is never double-counted as running prose.

use std::path::Path;

use crate::output::DocumentMetadata;

/// Errors surfaced by a concrete extraction backend.
///
/// Backends keep their own error types; the core wraps whatever comes up
/// into [`crate::error::CardAgreeError::CorruptDocument`] with document and
/// page context attached.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for backend operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// An axis-aligned region on a page, in the page's own coordinate space.
///
/// Coordinates follow the usual PDF-extraction convention: `x0`/`x1` grow
/// rightwards, `top`/`bottom` grow downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Whether `other`'s geometric midpoint falls inside this box.
    ///
    /// Half-open on the far edges (`< x1`, `< bottom`) so an element sitting
    /// exactly on the boundary between two adjacent regions is claimed by at
    /// most one of them.
    pub fn contains_midpoint(&self, other: &BoundingBox) -> bool {
        let h_mid = (other.x0 + other.x1) / 2.0;
        let v_mid = (other.top + other.bottom) / 2.0;
        h_mid >= self.x0 && h_mid < self.x1 && v_mid >= self.top && v_mid < self.bottom
    }
}

/// Parameters for layout-aware text extraction.
#[derive(Debug, Clone, Default)]
pub struct LayoutParams {
    /// Vertical density passed to the layout algorithm. Higher values merge
    /// closely spaced lines; the extraction pipeline tunes this to avoid
    /// spurious mid-paragraph breaks.
    pub y_density: f64,

    /// Regions whose text elements must be excluded from the returned text
    /// (an element is excluded when its midpoint lies in any region, per
    /// [`BoundingBox::contains_midpoint`]).
    pub exclude: Vec<BoundingBox>,
}

/// A table's raw cell grid: rows of optional cell strings. `None` marks a
/// cell the extractor could not populate (merged or empty in the source).
pub type TableGrid = Vec<Vec<Option<String>>>;

/// One page of an open document.
pub trait PageContentSource {
    /// Extract the page's running text in layout order, honouring
    /// [`LayoutParams`].
    fn text(&self, params: &LayoutParams) -> SourceResult<String>;

    /// Bounding boxes of the tables detected on this page.
    fn find_tables(&self) -> SourceResult<Vec<BoundingBox>>;

    /// Extract the cell grid of the table at `bbox`.
    fn extract_table(&self, bbox: &BoundingBox) -> SourceResult<TableGrid>;
}

/// An open document: file-level metadata plus page access.
pub trait DocumentSource {
    /// Flat title/author/etc. mapping copied from the source file.
    fn metadata(&self) -> DocumentMetadata;

    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Access one page by 0-based index.
    fn page(&self, index: usize) -> SourceResult<Box<dyn PageContentSource + '_>>;
}

/// Opens a document file and yields a [`DocumentSource`].
///
/// Implemented by extraction backends; the [`crate::reader::DocumentReader`]
/// validates the path first and wraps any open failure as `CorruptDocument`.
pub trait DocumentOpener {
    fn open(&self, path: &Path) -> SourceResult<Box<dyn DocumentSource>>;
}
