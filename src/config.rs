//! Configuration for document reading and LLM querying.
//!
//! Two small configs instead of one: [`ReaderConfig`] tunes the layout
//! reconstruction and is shared across every document in a batch, while
//! [`OracleConfig`] tunes the LLM side and is tied to one model. Both follow
//! the builder pattern so callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::CardAgreeError;

/// Configuration for [`crate::reader::DocumentReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Hard cap on pages read per document. Default: 50.
    ///
    /// Disclosure filings are occasionally bundled with hundreds of pages of
    /// unrelated boilerplate. Everything that answers the extraction
    /// questions sits in the first few dozen pages, so reading past 50 only
    /// burns time and LLM context budget.
    pub max_pages: usize,

    /// Detect tables and render them as markdown units. Default: true.
    ///
    /// When off, table regions are not excluded from the running text either,
    /// so their cell text leaks into prose paragraphs (most of it is then
    /// dropped by the numeric-fraction filter).
    pub detect_tables: bool,

    /// Retain each page's cleaned pre-segmentation text on its units for
    /// debugging. Default: false.
    pub inspect: bool,

    /// Vertical density for layout-aware text extraction. Default: 13.8.
    ///
    /// The extraction primitive's default (13) sometimes splits a paragraph
    /// across what is really a single visual block; 13.8 was tuned against
    /// the agreement corpus to avoid those spurious breaks.
    pub y_density: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            detect_tables: true,
            inspect: false,
            y_density: 13.8,
        }
    }
}

impl ReaderConfig {
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn detect_tables(mut self, v: bool) -> Self {
        self.config.detect_tables = v;
        self
    }

    pub fn inspect(mut self, v: bool) -> Self {
        self.config.inspect = v;
        self
    }

    pub fn y_density(mut self, d: f64) -> Self {
        self.config.y_density = d;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, CardAgreeError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(CardAgreeError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if !c.y_density.is_finite() || c.y_density <= 0.0 {
            return Err(CardAgreeError::InvalidConfig(format!(
                "y_density must be a positive number, got {}",
                c.y_density
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for [`crate::oracle::LlmOracle`].
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Model identifier sent with every request and baked into the cache
    /// fingerprint. Default: `gpt-4o-2024-05-13`.
    pub model: String,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low but non-zero: faithful field extraction wants near-deterministic
    /// output, and 0.2 matches the cached answers produced by earlier runs.
    pub temperature: f32,

    /// Maximum output tokens per completion. Default: 2000.
    ///
    /// The answer schema is a handful of short fields plus one quoted
    /// snippet; 2000 tokens is generous. A completion that hits this limit
    /// reports `finish_reason="length"` and is rejected as abnormal.
    pub max_output_tokens: u32,

    /// Context token budget before truncation. Default: 10000.
    ///
    /// Leaves headroom below the model context limit for the question text
    /// and for the inevitable mismatch between token count and the
    /// character-ratio truncation applied when the budget is exceeded.
    pub context_token_budget: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-2024-05-13".into(),
            temperature: 0.2,
            max_output_tokens: 2000,
            context_token_budget: 10000,
        }
    }
}

impl OracleConfig {
    pub fn builder() -> OracleConfigBuilder {
        OracleConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OracleConfig`].
#[derive(Debug)]
pub struct OracleConfigBuilder {
    config: OracleConfig,
}

impl OracleConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn context_token_budget(mut self, n: usize) -> Self {
        self.config.context_token_budget = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OracleConfig, CardAgreeError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(CardAgreeError::InvalidConfig(
                "model identifier must not be empty".into(),
            ));
        }
        if c.context_token_budget == 0 {
            return Err(CardAgreeError::InvalidConfig(
                "context_token_budget must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
