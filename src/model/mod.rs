pub mod models;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::error::CoreError;

const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Token counting and truncation for the model's input budget.
///
/// Implementations are shared by every request and must be deterministic:
/// the same text always counts and truncates the same way.
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> Result<usize, CoreError>;

    /// Keep at most `max_tokens` tokens of `text`. Returns the kept text and
    /// the untruncated token count.
    fn truncate(&self, text: &str, max_tokens: usize) -> Result<(String, usize), CoreError>;

    fn name(&self) -> &str;
}

/// HuggingFace `tokenizer.json` loaded through the `tokenizers` crate.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl HfTokenizer {
    pub fn from_file(path: &Path, model_id: &str) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Tokenizer not found at {}. Run `condense model download {model_id}` first.",
                path.display()
            );
        }
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {e}"))?;
        Ok(Self {
            inner,
            name: model_id.to_string(),
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, CoreError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| CoreError::Tokenization(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

impl Tokenizer for HfTokenizer {
    fn count(&self, text: &str) -> Result<usize, CoreError> {
        Ok(self.encode(text)?.len())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<(String, usize), CoreError> {
        let ids = self.encode(text)?;
        let total = ids.len();
        if total <= max_tokens {
            return Ok((text.to_string(), total));
        }
        let kept = self
            .inner
            .decode(&ids[..max_tokens], true)
            .map_err(|e| CoreError::Tokenization(e.to_string()))?;
        Ok((kept, total))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One token per whitespace-delimited word. Offline fallback when no
/// `tokenizer.json` has been downloaded; also handy in tests. Holds no state.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for WordTokenizer {
    fn count(&self, text: &str) -> Result<usize, CoreError> {
        Ok(text.split_whitespace().count())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<(String, usize), CoreError> {
        let total = self.count(text)?;
        let kept = text.split_whitespace().take(max_tokens).collect::<Vec<_>>().join(" ");
        Ok((kept, total))
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

pub fn tokenizer_path(model_id: &str) -> Result<PathBuf> {
    Ok(Config::model_dir()?.join(model_id).join(TOKENIZER_FILENAME))
}

/// Load the tokenizer for `model_id`, falling back to whitespace counting
/// when the model files are missing or unreadable.
pub fn load_tokenizer(model_id: &str) -> Arc<dyn Tokenizer> {
    let loaded = tokenizer_path(model_id).and_then(|p| HfTokenizer::from_file(&p, model_id));
    match loaded {
        Ok(t) => {
            tracing::info!("Tokenizer loaded for {model_id}");
            Arc::new(t)
        }
        Err(e) => {
            tracing::warn!("{e}. Falling back to whitespace token counting.");
            Arc::new(WordTokenizer::new())
        }
    }
}
