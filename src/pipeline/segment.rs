//! Paragraph segmentation: group cleaned lines into coherent paragraphs.
//!
//! Layout-aware extraction gives us one physical line per output line, with
//! blank lines marking vertical gaps. A paragraph is the run of non-blank
//! lines between two gaps, joined with single spaces. Two repairs happen on
//! the way:
//!
//! * Run-together bullet lists: the source PDFs mark bullets with a
//!   private-use glyph (U+F0B7, the Symbol-font bullet). A paragraph
//!   containing it is re-split into one `"- "` line per bullet.
//! * Trailing page numbers: the last "paragraph" of a page is often just the
//!   page number; a purely numeric final paragraph is dropped.
//!
//! [`should_reject`] is a separate filter applied by the caller, not inside
//! [`segment`], so inspection tooling can still see what was thrown away.

use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize::normalize_for_match;

/// Private-use-area bullet glyph used by the source PDFs (Symbol font).
const BULLET_GLYPH: char = '\u{f0b7}';

static RE_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Split cleaned page text into paragraphs.
///
/// Lines are trimmed and internally collapsed; blank lines close the current
/// paragraph; a virtual trailing blank line flushes the last one. A final
/// purely numeric paragraph (a page-number artefact) is discarded.
pub fn segment(cleaned_text: &str) -> Vec<String> {
    let mut paras: Vec<String> = Vec::new();
    let mut parts: Vec<String> = Vec::new();

    let lines = cleaned_text
        .split('\n')
        .map(fix_line)
        .chain(std::iter::once(String::new()));

    for line in lines {
        if line.is_empty() {
            if !parts.is_empty() {
                let mut para = parts.join(" ");
                if para.contains(BULLET_GLYPH) {
                    para = fix_bullet_list(&para);
                }
                paras.push(para);
                parts.clear();
            }
        } else {
            parts.push(line);
        }
    }

    if paras
        .last()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
    {
        paras.pop();
    }

    paras
}

/// Trim a line and collapse internal whitespace runs to single spaces.
fn fix_line(line: &str) -> String {
    let line = line.trim();
    let line = RE_MULTI_SPACE.replace_all(line, " ");
    line.replace('\u{201d}', "\"").replace('\u{201c}', "\"")
}

/// Re-split a run-together bullet list into one `"- "` line per item.
fn fix_bullet_list(para: &str) -> String {
    para.split(BULLET_GLYPH)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether a paragraph should be dropped from the output stream.
///
/// Rules, in order:
/// 1. Empty after preprocessing.
/// 2. More than 60% of whitespace-delimited tokens are purely numeric once
///    `.` and `%` are stripped — table rows that leaked past the geometric
///    exclusion look exactly like this.
/// 3. Starts with `"TABLE "` (case-insensitive) and is under 80 characters:
///    a stray table caption.
/// 4. Under 15 characters: too short to carry information.
/// 5. Nothing left after [`normalize_for_match`] — pure symbols/ornaments.
pub fn should_reject(para: &str) -> bool {
    if para.is_empty() {
        return true;
    }

    let words: Vec<&str> = para.split_whitespace().collect();
    if words.is_empty() {
        return true;
    }
    let numeric = words
        .iter()
        .filter(|w| {
            let stripped: String = w.chars().filter(|&c| c != '.' && c != '%').collect();
            !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
        })
        .count();
    if numeric as f64 / words.len() as f64 > 0.6 {
        return true;
    }

    let char_len = para.chars().count();
    if para.to_uppercase().starts_with("TABLE ") && char_len < 80 {
        return true;
    }

    if char_len < 15 {
        return true;
    }

    if normalize_for_match(para).is_empty() {
        return true;
    }

    false
}
