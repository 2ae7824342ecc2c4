//! Text normalisation: cleanup of raw extracted page text.
//!
//! Two classes of noise come out of the extraction primitive:
//!
//! * Typographic quote variants (`“ ” ‟ ’`) that downstream string matching
//!   and the LLM both handle worse than their ASCII equivalents.
//! * `(cid:N)` placeholder tokens emitted for glyphs the extractor cannot
//!   decode. Long runs of these (bar charts and decorative rules in older
//!   PDFs) make the LLM loop on the repeated pattern until it hits the token
//!   limit, so runs are deleted outright. A single token surrounded by
//!   whitespace is almost always a bullet glyph, so it becomes a literal
//!   `"- "` list marker instead.
//!
//! All functions are pure and [`clean`] is idempotent: cleaning already
//! cleaned text changes nothing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Two or more consecutive `(cid:N)` tokens: garbled chart/ornament text.
static RE_GARBLED_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\(cid:\d+\)){2,}").unwrap());

/// A lone `(cid:N)` token between whitespace: usually a list bullet. The
/// cid number varies per font (1, 2, 130, 190, 216, …), so match any.
static RE_LONE_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s\(cid:\d+\) ").unwrap());

/// Clean raw page text: normalise quotes, strip garbled glyph runs, turn
/// isolated glyph tokens into bullet markers.
pub fn clean(raw: &str) -> String {
    let text = raw
        .replace('\u{201f}', "\"") // double high-reversed-9 quotation mark
        .replace('\u{201c}', "\"") // left double quotation mark
        .replace('\u{201d}', "\"") // right double quotation mark
        .replace('\u{2019}', "'");

    let text = RE_GARBLED_RUN.replace_all(&text, "");
    RE_LONE_GLYPH.replace_all(&text, "- ").into_owned()
}

/// Lowercase and strip everything outside `[a-z0-9 .-]`.
///
/// Used by the paragraph filter: a paragraph whose normalised form is empty
/// carries no matchable content and is dropped.
pub fn normalize_for_match(text: &str) -> String {
    static RE_TEXT_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 .-]").unwrap());
    RE_TEXT_ONLY.replace_all(&text.to_lowercase(), "").into_owned()
}
