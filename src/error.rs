//! Error types for the cardagree library.
//!
//! The taxonomy separates failures by blast radius:
//!
//! * Document-level (`InvalidDocument`, `CorruptDocument`) — fatal for that
//!   document only. A batch driver should log and continue with the next file.
//! * Request-level (`NonNormalCompletion`, `MalformedResponse`) — fatal for
//!   that LLM request. No retry is performed here; retry policy belongs to
//!   the caller, which has the rate-limit and cost context we lack.
//! * Startup (`MissingCredential`, `InvalidConfig`, `TokenizerLoad`) — the
//!   process is misconfigured and should fail fast before any work is done.
//!
//! Every fatal variant carries enough context (path, fingerprint, finish
//! reason) that a failed document or request can be located and reprocessed
//! manually.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the cardagree library.
#[derive(Debug, Error)]
pub enum CardAgreeError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The path does not reference a readable PDF file.
    #[error("Invalid document '{path}': {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// The document exists but could not be opened or parsed. Aborts this
    /// document; other documents in a batch are unaffected.
    #[error("Corrupt document '{path}': {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    // ── LLM request errors ────────────────────────────────────────────────
    /// The completion stopped for a reason other than normal termination
    /// (e.g. `"length"`). A truncated JSON body cannot be trusted to parse,
    /// so the request fails loudly instead of guessing at a partial answer.
    #[error(
        "LLM completion ended abnormally (finish_reason=\"{finish_reason}\") \
         for request {fingerprint}"
    )]
    NonNormalCompletion {
        finish_reason: String,
        fingerprint: String,
    },

    /// The provider reported a clean stop but the body is not a JSON object.
    #[error("LLM response for request {fingerprint} is not valid JSON: {detail}")]
    MalformedResponse { detail: String, fingerprint: String },

    /// The LLM API returned a non-success HTTP status.
    #[error("LLM API error (HTTP {status}): {message}")]
    LlmApi { status: u16, message: String },

    /// Transport-level HTTP failure talking to the LLM provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ── Cache errors ──────────────────────────────────────────────────────
    /// The cache backend failed (open, read, write, or commit).
    #[error("Cache store error: {0}")]
    Cache(#[from] rusqlite::Error),

    /// A stored cache value could not be decoded. The entry is unusable;
    /// delete it from the store to force a fresh query.
    #[error("Cache entry {fingerprint} is corrupt: {detail}")]
    CacheValue { fingerprint: String, detail: String },

    // ── Startup errors ────────────────────────────────────────────────────
    /// No API credential was supplied to the client constructor.
    #[error("Missing LLM API credential.\nPass the provider API key explicitly when constructing the client.")]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A tokenizer definition could not be loaded from disk.
    #[error("Failed to load tokenizer from '{path}': {detail}")]
    TokenizerLoad { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the assembled prompt transcript for auditing.
    #[error("Failed to write prompt transcript '{path}': {source}")]
    TranscriptWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
