//! # cardagree
//!
//! Reconstruct the logical paragraph and table structure of scanned
//! credit-card disclosure agreements, then extract structured fields from
//! each document through a cached, schema-constrained LLM query.
//!
//! ## Why this crate?
//!
//! Raw positioned-text extraction from typeset PDFs gives you lines, not
//! meaning: paragraphs split mid-sentence, table cells leak into prose,
//! bullet lists run together, and undecodable glyphs surface as `(cid:N)`
//! noise that makes LLMs loop. This crate rebuilds an ordered stream of
//! coherent paragraphs and markdown tables from that raw geometry, and then
//! answers a fixed extraction question against the rebuilt text — caching
//! every answer by a fingerprint of the exact prompt and model, so re-runs
//! over a corpus cost nothing for documents already processed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF path
//!  │
//!  ├─ 1. Read      validate path, open via a DocumentOpener backend
//!  ├─ 2. Pages     per page: table bboxes → exclusion → layout text
//!  ├─ 3. Rebuild   normalize → segment → filter; tables → markdown
//!  ├─ 4. Assemble  units joined into the LLM context, question prepended
//!  ├─ 5. Cache     SHA-256(prompt + model) lookup in a per-period store
//!  └─ 6. Query     JSON-mode completion, validated and cached
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use cardagree::{
//!     CharRatioCounter, LlmCache, LlmOracle, OpenAiClient, OracleConfig,
//!     QueryRequest, prompts,
//! };
//!
//! fn main() -> Result<(), cardagree::CardAgreeError> {
//!     let client = OpenAiClient::new(std::env::var("OPENAI_API_KEY").unwrap_or_default())?;
//!     let cache = LlmCache::open_period(Path::new("llm-cache"), "2023Q4")?;
//!     let mut oracle = LlmOracle::new(
//!         Box::new(client),
//!         Box::new(CharRatioCounter::default()),
//!         OracleConfig::default(),
//!     )
//!     .with_cache(cache);
//!
//!     // `context` is DocumentExtractionResult::context() for one document.
//!     let context = "reconstructed agreement text…";
//!     let answer = oracle.find_answer(QueryRequest::new(prompts::AGREEMENT_QUESTION, context))?;
//!     println!("{}", answer.get_str("bank_name").unwrap_or(""));
//!     Ok(())
//! }
//! ```
//!
//! ## Scope
//!
//! The crate is deliberately single-threaded and synchronous: one document,
//! one page, one LLM call at a time. Retry/backoff, rate limiting, batch
//! orchestration, and result bookkeeping belong to the caller. Concrete PDF
//! extraction backends plug in behind the [`source`] capability traits; the
//! core never depends on a specific PDF library.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod reader;
pub mod source;
pub mod tokens;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{fingerprint, KvStore, LlmCache, MemoryStore, SqliteStore};
pub use client::{Completion, CompletionClient, CompletionRequest, OpenAiClient};
pub use config::{OracleConfig, OracleConfigBuilder, ReaderConfig, ReaderConfigBuilder};
pub use error::CardAgreeError;
pub use oracle::{Answer, LlmOracle, QueryRequest};
pub use output::{ContentRecord, ContentUnit, DocumentExtractionResult, DocumentMetadata, UnitKind};
pub use reader::{DocumentReader, ReadCounters, UnitStream};
pub use source::{
    BoundingBox, DocumentOpener, DocumentSource, LayoutParams, PageContentSource, SourceError,
    SourceResult, TableGrid,
};
pub use tokens::{CharRatioCounter, HfTokenCounter, TokenCounter};
