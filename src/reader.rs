//! Document reading: drive page extraction across one document.
//!
//! [`DocumentReader`] validates the input path up front, then iterates pages
//! strictly in increasing order through whatever [`DocumentOpener`] backend
//! the caller supplies. Pages are processed one at a time — a page's units
//! are fully yielded before the next page is touched — so memory stays flat
//! regardless of document size, and a hard page cap protects against the
//! occasional thousand-page filing.
//!
//! Two entry points mirror the two consumption styles: [`DocumentReader::stream`]
//! for lazy unit-at-a-time iteration, [`DocumentReader::read_all`] to collect
//! the whole document plus counters in one call.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ReaderConfig;
use crate::error::CardAgreeError;
use crate::output::{ContentUnit, DocumentExtractionResult, DocumentMetadata};
use crate::pipeline::page::extract_page;
use crate::source::{DocumentOpener, DocumentSource};

/// Running counters exposed while a document streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounters {
    /// Pages read so far (never exceeds the configured cap).
    pub pages: usize,
    /// Text units yielded so far.
    pub paragraphs: usize,
    /// Table units yielded so far.
    pub tables: usize,
}

/// Reads one document into an ordered stream of content units.
#[derive(Debug)]
pub struct DocumentReader {
    path: PathBuf,
    name: String,
    config: ReaderConfig,
}

impl DocumentReader {
    /// Create a reader for `path`, validating that it names an existing
    /// `.pdf` file.
    ///
    /// # Errors
    /// [`CardAgreeError::InvalidDocument`] when the path does not exist, is
    /// not a file, or lacks the `.pdf` extension.
    pub fn new(path: impl Into<PathBuf>, config: ReaderConfig) -> Result<Self, CardAgreeError> {
        let path = path.into();
        if !path.is_file() {
            return Err(CardAgreeError::InvalidDocument {
                path,
                reason: "not an existing file".into(),
            });
        }
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(CardAgreeError::InvalidDocument {
                path,
                reason: "expected a .pdf extension".into(),
            });
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { path, name, config })
    }

    /// The file stem, used as the document identifier in logs and reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the document and return a lazy unit stream.
    ///
    /// # Errors
    /// [`CardAgreeError::CorruptDocument`] when the backend fails to open or
    /// parse the file.
    pub fn stream(&self, opener: &dyn DocumentOpener) -> Result<UnitStream, CardAgreeError> {
        info!("Processing document \"{}\"", self.path.display());
        let source = opener
            .open(&self.path)
            .map_err(|e| CardAgreeError::CorruptDocument {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;
        let metadata = source.metadata();
        let total_pages = source.page_count();
        info!(" - Reading text from PDF ({total_pages} pages)");

        Ok(UnitStream {
            source,
            metadata,
            path: self.path.clone(),
            config: self.config.clone(),
            last_page: total_pages.min(self.config.max_pages),
            next_page: 1,
            next_order: 0,
            buffered: VecDeque::new(),
            counters: ReadCounters::default(),
            failed: false,
        })
    }

    /// Read the whole document eagerly.
    pub fn read_all(
        &self,
        opener: &dyn DocumentOpener,
    ) -> Result<DocumentExtractionResult, CardAgreeError> {
        let mut stream = self.stream(opener)?;
        let mut units = Vec::new();
        for unit in stream.by_ref() {
            units.push(unit?);
        }
        let counters = stream.counters();
        Ok(DocumentExtractionResult {
            units,
            num_pages: counters.pages,
            num_paragraphs: counters.paragraphs,
            num_tables: counters.tables,
            metadata: stream.metadata().clone(),
        })
    }
}

/// Lazy, finite, non-restartable stream of [`ContentUnit`]s for one document.
///
/// At most one page's units are buffered at a time. A page-level extraction
/// failure ends the stream with a single `CorruptDocument` error; the stream
/// is fused afterwards.
pub struct UnitStream {
    source: Box<dyn DocumentSource>,
    metadata: DocumentMetadata,
    path: PathBuf,
    config: ReaderConfig,
    last_page: usize,
    next_page: usize,
    next_order: usize,
    buffered: VecDeque<ContentUnit>,
    counters: ReadCounters,
    failed: bool,
}

impl UnitStream {
    /// Counters as of the units yielded so far.
    pub fn counters(&self) -> ReadCounters {
        self.counters
    }

    /// File-level metadata copied when the document was opened.
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Read pages until at least one unit is buffered or pages run out.
    fn fill_buffer(&mut self) -> Result<(), CardAgreeError> {
        while self.buffered.is_empty() && self.next_page <= self.last_page {
            let page_num = self.next_page;
            self.next_page += 1;

            let units = self
                .source
                .page(page_num - 1)
                .and_then(|page| extract_page(page.as_ref(), page_num, &self.config))
                .map_err(|e| CardAgreeError::CorruptDocument {
                    path: self.path.clone(),
                    detail: format!("page {page_num}: {e}"),
                })?;

            self.counters.pages += 1;
            for mut unit in units {
                unit.order_hint = Some(self.next_order);
                self.next_order += 1;
                match unit.kind {
                    crate::output::UnitKind::Text => self.counters.paragraphs += 1,
                    crate::output::UnitKind::Table => self.counters.tables += 1,
                }
                self.buffered.push_back(unit);
            }
        }
        Ok(())
    }
}

impl Iterator for UnitStream {
    type Item = Result<ContentUnit, CardAgreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.buffered.is_empty() {
            if let Err(e) = self.fill_buffer() {
                self.failed = true;
                return Some(Err(e));
            }
        }
        self.buffered.pop_front().map(Ok)
    }
}
