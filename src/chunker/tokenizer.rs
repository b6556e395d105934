//! Token counting.

use std::fmt;
use std::sync::Arc;

use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};

use crate::error::{Error, Result};

/// Encodes text to token ids.
///
/// Implementations must be deterministic; chunk boundaries depend on the
/// counts.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<usize>;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// BPE tokenizer backed by tiktoken.
#[derive(Clone)]
pub struct TiktokenTokenizer {
    name: String,
    bpe: Arc<CoreBPE>,
}

impl TiktokenTokenizer {
    /// The `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self> {
        let bpe = cl100k_base()
            .map_err(|e| Error::Tokenizer(format!("Failed to load cl100k_base: {}", e)))?;
        Ok(Self {
            name: "cl100k_base".to_string(),
            bpe: Arc::new(bpe),
        })
    }

    /// The encoding used by an OpenAI model name such as `gpt-4`.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = get_bpe_from_model(model).map_err(|e| {
            Error::Tokenizer(format!("Failed to load tokenizer for {}: {}", model, e))
        })?;
        Ok(Self {
            name: model.to_string(),
            bpe: Arc::new(bpe),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_with_special_tokens(text)
    }
}

impl fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("name", &self.name)
            .finish()
    }
}

/// One token per whitespace-separated word.
///
/// Needs no vocabulary download; handy for tests and quick runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Vec<usize> {
        text.split_whitespace()
            .enumerate()
            .map(|(i, _)| i)
            .collect()
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
