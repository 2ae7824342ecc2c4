//! Integration tests for the oracle + cache pair.
//!
//! Exercises the full request lifecycle against the sqlite-backed store:
//! miss → query → commit, then hit from a *fresh* oracle over the same cache
//! file, which is exactly the restart-a-batch scenario the cache exists for.

use std::cell::RefCell;
use std::path::Path;

use cardagree::{
    fingerprint, CardAgreeError, Completion, CompletionClient, CompletionRequest, LlmCache,
    LlmOracle, OracleConfig, QueryRequest, TokenCounter,
};

/// Route oracle/cache logs through the test harness; `RUST_LOG` overrides
/// the default filter. Safe to call from every test, first caller wins.
fn init_logs() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

// ── Fakes ────────────────────────────────────────────────────────────────

/// Client that returns canned completions and counts calls.
struct CannedClient {
    completions: RefCell<Vec<Completion>>,
    calls: RefCell<usize>,
}

impl CannedClient {
    fn new(completions: Vec<Completion>) -> Self {
        Self {
            completions: RefCell::new(completions),
            calls: RefCell::new(0),
        }
    }
}

impl CompletionClient for CannedClient {
    fn complete(&self, _request: &CompletionRequest<'_>) -> Result<Completion, CardAgreeError> {
        *self.calls.borrow_mut() += 1;
        Ok(self.completions.borrow_mut().remove(0))
    }
}

struct FourCharCounter;

impl TokenCounter for FourCharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count() / 4
    }
}

fn answer_json() -> &'static str {
    r#"{
        "bank_name": "Acme Bank N.A.",
        "product_name": "Active Cash Card",
        "card_network": "Visa",
        "gambling_prohibited": "yes",
        "gambling_snippet": "Internet gambling or betting transactions are prohibited."
    }"#
}

fn oracle_over(cache_dir: &Path, completions: Vec<Completion>) -> LlmOracle {
    init_logs();
    let cache = LlmCache::open_period(cache_dir, "2023Q4").unwrap();
    LlmOracle::new(
        Box::new(CannedClient::new(completions)),
        Box::new(FourCharCounter),
        OracleConfig::default(),
    )
    .with_cache(cache)
}

fn stop(content: &str, total_tokens: u64) -> Completion {
    Completion {
        finish_reason: "stop".into(),
        content: content.into(),
        total_tokens,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[test]
fn answers_survive_a_restart_through_the_cache_file() {
    let dir = tempfile::tempdir().unwrap();
    let question = "Extract the agreement fields. CONTEXT:\n\n";
    let context = "Acme Bank N.A. issues the Active Cash Card on the Visa network.";

    // First run: cache miss, one LLM call, answer committed.
    let mut first_run = oracle_over(dir.path(), vec![stop(answer_json(), 1234)]);
    let first = first_run
        .find_answer(QueryRequest::new(question, context))
        .unwrap();
    assert_eq!(first.source(), Some("llm"));
    assert_eq!(first.usage(), 1234);
    drop(first_run);

    // Second run, new oracle over the same cache directory: no completions
    // scripted, so any LLM call would panic. Must be served from sqlite.
    let mut second_run = oracle_over(dir.path(), vec![]);
    let second = second_run
        .find_answer(QueryRequest::new(question, context))
        .unwrap();
    assert_eq!(second.source(), Some("cache"));
    assert_eq!(second.usage(), 0, "cached answers cost zero tokens");
    assert_eq!(second.get_str("bank_name"), Some("Acme Bank N.A."));
    assert_eq!(second.get_str("gambling_prohibited"), Some("yes"));
    assert_eq!(
        second.get_str("llm"),
        Some("gpt-4o-2024-05-13"),
        "provenance re-annotated on hit"
    );
}

#[test]
fn changed_context_or_model_forces_a_fresh_query() {
    let dir = tempfile::tempdir().unwrap();
    let question = "Extract the agreement fields. CONTEXT:\n\n";

    let mut oracle = oracle_over(
        dir.path(),
        vec![stop(answer_json(), 100), stop(r#"{"bank_name": "Other"}"#, 90)],
    );
    let a = oracle
        .find_answer(QueryRequest::new(question, "context A"))
        .unwrap();
    let b = oracle
        .find_answer(QueryRequest::new(question, "context B"))
        .unwrap();
    assert_eq!(a.source(), Some("llm"));
    assert_eq!(b.source(), Some("llm"));
    assert_eq!(b.get_str("bank_name"), Some("Other"));
}

#[test]
fn fingerprints_are_stable_across_processes() {
    // The composition `prompt + "\n" + "INFO: llm=" + model` is a wire
    // format; this digest must never change between releases.
    let fp = fingerprint("QUESTIONCONTEXT", "gpt-4o-2024-05-13");
    assert_eq!(fp.len(), 64);
    assert_eq!(fp, fingerprint("QUESTIONCONTEXT", "gpt-4o-2024-05-13"));
    assert_ne!(fp, fingerprint("QUESTIONCONTEXT", "gpt-4o-mini"));
}

#[test]
fn abnormal_completion_leaves_no_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    let question = "Extract. CONTEXT:\n\n";
    let context = "Some agreement text.";

    let mut oracle = oracle_over(
        dir.path(),
        vec![Completion {
            finish_reason: "length".into(),
            content: r#"{"bank_name": "Acm"#.into(),
            total_tokens: 2000,
        }],
    );
    let err = oracle
        .find_answer(QueryRequest::new(question, context))
        .unwrap_err();
    assert!(matches!(err, CardAgreeError::NonNormalCompletion { .. }));
    drop(oracle);

    // A later run with a healthy completion gets a miss, not a poisoned hit.
    let mut retry = oracle_over(dir.path(), vec![stop(answer_json(), 700)]);
    let answer = retry
        .find_answer(QueryRequest::new(question, context))
        .unwrap();
    assert_eq!(answer.source(), Some("llm"));
}
