//! Token counting for context-budget enforcement.
//!
//! The oracle needs a token count of the context before it assembles the
//! prompt, so oversized documents can be truncated instead of bounced by the
//! provider. Counting is a trait seam because the "right" tokenizer depends
//! on the model: ship a `tokenizer.json` for exact counts, or fall back to a
//! character ratio. Truncation divides the budget by the count and scales
//! character length, so a consistently-biased estimate still lands within
//! the headroom the budget already reserves.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::debug;

use crate::error::CardAgreeError;

/// Counts tokens the way the target model would.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// Exact counting via a HuggingFace `tokenizer.json` definition.
#[derive(Debug)]
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
}

impl HfTokenCounter {
    /// Load a tokenizer definition from disk.
    pub fn from_file(path: &Path) -> Result<Self, CardAgreeError> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| CardAgreeError::TokenizerLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                // Encoding failures are rare (malformed unicode edge cases);
                // a ratio estimate keeps the truncation math sane.
                debug!("tokenizer encode failed ({e}); falling back to char ratio");
                CharRatioCounter::default().count(text)
            }
        }
    }
}

/// Ratio-based estimate: roughly 4 characters per token for English prose.
#[derive(Debug, Clone, Copy)]
pub struct CharRatioCounter {
    pub chars_per_token: f64,
}

impl Default for CharRatioCounter {
    fn default() -> Self {
        Self {
            chars_per_token: 4.0,
        }
    }
}

impl TokenCounter for CharRatioCounter {
    fn count(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}
