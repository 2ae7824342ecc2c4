//! The LLM oracle: assemble, look up, query, validate.
//!
//! Per request the oracle walks a fixed state machine:
//!
//! ```text
//! ASSEMBLE ──▶ CACHE_LOOKUP ──hit──▶ done (source="cache", usage=0)
//!                  │
//!                 miss
//!                  ▼
//!               QUERY ──▶ VALIDATE ──ok──▶ cache insert ──▶ done (source="llm")
//!                              │
//!                              └─▶ fatal (NonNormalCompletion / MalformedResponse)
//! ```
//!
//! Identical (question, context, model) triples always produce the same
//! fingerprint, and a cached fingerprint is never re-queried. Cached answers
//! report `usage = 0`: they cost nothing beyond the original call.
//!
//! Abnormal stop reasons are fatal by design. A body cut off by the output
//! token limit is not valid JSON and guessing at a partial answer would
//! silently poison the result table; the error carries the fingerprint so
//! the request can be found and reprocessed.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cache::{fingerprint, LlmCache};
use crate::client::{CompletionClient, CompletionRequest};
use crate::config::OracleConfig;
use crate::error::CardAgreeError;
use crate::tokens::TokenCounter;

/// One oracle request: question plus reconstructed-document context.
///
/// The full prompt is `question + context`, raw concatenation with no
/// separator — an inherited-format contract baked into every existing cache
/// fingerprint, not a stylistic choice.
#[derive(Debug, Clone)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    pub context: &'a str,
    /// Overrides the configured sampling temperature for this request.
    pub temperature: Option<f32>,
    /// When set, the fully assembled prompt is written here before querying,
    /// for manual audit of what the model actually saw.
    pub transcript: Option<&'a Path>,
}

impl<'a> QueryRequest<'a> {
    pub fn new(question: &'a str, context: &'a str) -> Self {
        Self {
            question,
            context,
            temperature: None,
            transcript: None,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn transcript(mut self, path: &'a Path) -> Self {
        self.transcript = Some(path);
        self
    }
}

/// A validated, annotated answer: the model's JSON object plus provenance
/// fields (`source`, `usage`, `llm`, `temperature`).
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    fields: Map<String, Value>,
}

impl Answer {
    fn from_value(value: Value, fp: &str) -> Result<Self, CardAgreeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(CardAgreeError::MalformedResponse {
                detail: format!("expected a JSON object, got {other}"),
                fingerprint: fp.to_string(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Provenance: `"cache"` or `"llm"`.
    pub fn source(&self) -> Option<&str> {
        self.get_str("source")
    }

    /// Tokens billed for this answer; 0 for cache hits.
    pub fn usage(&self) -> u64 {
        self.get("usage").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Answers questions about a document via a cached, schema-constrained LLM.
pub struct LlmOracle {
    client: Box<dyn CompletionClient>,
    counter: Box<dyn TokenCounter>,
    cache: Option<LlmCache>,
    config: OracleConfig,
}

impl LlmOracle {
    pub fn new(
        client: Box<dyn CompletionClient>,
        counter: Box<dyn TokenCounter>,
        config: OracleConfig,
    ) -> Self {
        Self {
            client,
            counter,
            cache: None,
            config,
        }
    }

    /// Attach an answer cache. Without one every request queries the LLM.
    pub fn with_cache(mut self, cache: LlmCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Resolve one request through the state machine.
    pub fn find_answer(&mut self, request: QueryRequest<'_>) -> Result<Answer, CardAgreeError> {
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        // ── ASSEMBLE ──────────────────────────────────────────────────────
        let context = self.truncate_context(request.context);
        let full_prompt = format!("{}{}", request.question, context);

        if let Some(path) = request.transcript {
            std::fs::write(path, &full_prompt).map_err(|source| {
                CardAgreeError::TranscriptWriteFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        }

        // ── CACHE_LOOKUP ──────────────────────────────────────────────────
        let fp = fingerprint(&full_prompt, &self.config.model);
        if let Some(cache) = &self.cache {
            if let Some(stored) = cache.get(&fp)? {
                info!("Loading LLM response from cache");
                let mut answer = Answer::from_value(stored, &fp).map_err(|e| match e {
                    CardAgreeError::MalformedResponse { detail, .. } => {
                        CardAgreeError::CacheValue {
                            fingerprint: fp.clone(),
                            detail,
                        }
                    }
                    other => other,
                })?;
                answer.set("source", "cache");
                answer.set("usage", 0);
                return Ok(self.annotate(answer, temperature));
            }
        }

        // ── QUERY ─────────────────────────────────────────────────────────
        info!("Querying LLM (model=\"{}\")", self.config.model);
        let completion = self.client.complete(&CompletionRequest {
            model: &self.config.model,
            prompt: &full_prompt,
            temperature,
            max_tokens: self.config.max_output_tokens,
        })?;

        // ── VALIDATE ──────────────────────────────────────────────────────
        if completion.finish_reason != "stop" {
            return Err(CardAgreeError::NonNormalCompletion {
                finish_reason: completion.finish_reason,
                fingerprint: fp,
            });
        }

        let parsed: Value = serde_json::from_str(&completion.content).map_err(|e| {
            CardAgreeError::MalformedResponse {
                detail: e.to_string(),
                fingerprint: fp.clone(),
            }
        })?;
        let mut answer = Answer::from_value(parsed, &fp)?;
        answer.set("usage", completion.total_tokens);

        if let Some(cache) = &mut self.cache {
            cache.put(&fp, &answer.as_value())?;
        }

        answer.set("source", "llm");
        Ok(self.annotate(answer, temperature))
    }

    /// Truncate the context when it exceeds the token budget.
    ///
    /// Scaling by `budget / num_tokens` over the character length leaves
    /// headroom for the question and for token/character mismatch; the `+ 1`
    /// matches the arithmetic every existing cache entry was produced with.
    fn truncate_context<'c>(&self, context: &'c str) -> std::borrow::Cow<'c, str> {
        let budget = self.config.context_token_budget;
        let num_tokens = self.counter.count(context);
        if num_tokens < budget {
            return std::borrow::Cow::Borrowed(context);
        }
        let char_len = context.chars().count();
        let ratio = budget as f64 / num_tokens as f64;
        let new_len = (ratio * char_len as f64) as usize + 1;
        warn!(
            " - Warning: had to reduce the size of the context to fit max context length (was: {num_tokens})"
        );
        std::borrow::Cow::Owned(context.chars().take(new_len).collect())
    }

    fn annotate(&self, mut answer: Answer, temperature: f32) -> Answer {
        answer.set("llm", self.config.model.as_str());
        answer.set("temperature", temperature as f64);
        answer
    }
}
