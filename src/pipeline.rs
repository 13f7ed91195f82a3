//! The chunking controller: decides between one summarizer call and a
//! chunked pass, enforces the token budget, and stitches chunk summaries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::chunking::{ChunkOptions, ChunkPlan, Coverage};
use crate::config::{Backend, Config};
use crate::error::CoreError;
use crate::model::{self, Tokenizer};
use crate::summarizer::{HttpSummarizer, LeadSummarizer, LengthParams, Summarizer};

/// Final output of one summarize request.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub text: String,
    /// Summarizer invocations made (1 for the single-call path).
    pub chunks: usize,
    /// Token count of the whole input document.
    pub token_count: usize,
    /// True when content past the token budget was dropped.
    pub truncated: bool,
}

/// Process-wide summarization service. Build once at startup and share as
/// `Arc<Pipeline>`; nothing inside is mutated after construction.
pub struct Pipeline {
    tokenizer: Arc<dyn Tokenizer>,
    summarizer: Arc<dyn Summarizer>,
    options: ChunkOptions,
    call_timeout: Option<Duration>,
    permits: Option<Arc<Semaphore>>,
}

impl Pipeline {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, summarizer: Arc<dyn Summarizer>, options: ChunkOptions) -> Self {
        Self {
            tokenizer,
            summarizer,
            options,
            call_timeout: None,
            permits: None,
        }
    }

    /// Bound every summarizer invocation. Expiry fails the request.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Allow at most `n` summarizer invocations in flight across all requests.
    pub fn with_max_concurrent_calls(mut self, n: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(n.max(1))));
        self
    }

    /// Load the tokenizer and summarizer backend named by `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let model = cfg.model_info()?;
        let tokenizer = model::load_tokenizer(model.id);

        let summarizer: Arc<dyn Summarizer> = match cfg.backend {
            Backend::Http => Arc::new(HttpSummarizer::new(&cfg.inference_url, model, cfg.resolved_api_token())?),
            Backend::Lead => Arc::new(LeadSummarizer),
        };
        tracing::info!(
            "Summarizer backend: {} ({}), token budget {}",
            cfg.backend,
            summarizer.name(),
            cfg.token_budget()
        );

        let mut pipeline = Self::new(tokenizer, summarizer, cfg.chunk_options());
        if cfg.call_timeout_secs > 0 {
            pipeline = pipeline.with_call_timeout(Duration::from_secs(cfg.call_timeout_secs));
        }
        if let Some(n) = cfg.max_concurrent_calls {
            pipeline = pipeline.with_max_concurrent_calls(n);
        }
        Ok(pipeline)
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    pub fn tokenizer_name(&self) -> &str {
        self.tokenizer.name()
    }

    pub fn summarizer_name(&self) -> &str {
        self.summarizer.name()
    }

    /// Summarize `document`, chunking it when it does not fit the token budget.
    ///
    /// Below the budget the summarizer sees the document verbatim, once.
    /// Otherwise every chunk is summarized in order with the same length
    /// parameters and the results are joined by single spaces. Any chunk
    /// failure fails the whole call.
    pub async fn summarize(&self, document: &str, params: LengthParams) -> Result<Summary, CoreError> {
        if document.trim().is_empty() {
            return Err(CoreError::input("Document is empty"));
        }

        let budget = self.options.token_budget;
        let (kept, token_count) = self.tokenizer.truncate(document, budget)?;

        if token_count < budget {
            tracing::info!("Document fits budget ({token_count}/{budget} tokens); single call");
            let text = self.invoke(0, document, params).await?;
            return Ok(Summary {
                text,
                chunks: 1,
                token_count,
                truncated: false,
            });
        }

        let (effective, truncated) = match self.options.coverage {
            Coverage::Full => (document.to_string(), false),
            Coverage::Budget => (kept, true),
        };

        let plan = ChunkPlan::build(&effective, &self.options, self.tokenizer.as_ref())?;
        if plan.is_empty() {
            return Err(CoreError::input("Document has no words to summarize"));
        }
        tracing::info!(
            "Document is {token_count} tokens (budget {budget}); {} chunks over {} words{}",
            plan.len(),
            plan.word_count(),
            if truncated { ", truncated to budget" } else { "" }
        );

        let mut parts = Vec::with_capacity(plan.len());
        for chunk in &plan {
            parts.push(self.invoke(chunk.index, &chunk.text, params).await?);
        }

        Ok(Summary {
            text: parts.join(" "),
            chunks: plan.len(),
            token_count,
            truncated,
        })
    }

    async fn invoke(&self, chunk: usize, text: &str, params: LengthParams) -> Result<String, CoreError> {
        let _permit = match &self.permits {
            Some(sem) => Some(sem.acquire().await.map_err(|e| CoreError::Summarizer {
                chunk,
                message: e.to_string(),
            })?),
            None => None,
        };

        let started = Instant::now();
        let call = self.summarizer.summarize(text, params);
        let result = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| CoreError::Timeout {
                chunk,
                secs: limit.as_secs(),
            })?,
            None => call.await,
        };

        let output = result.map_err(|e| CoreError::Summarizer {
            chunk,
            message: format!("{e:#}"),
        })?;
        tracing::debug!("Chunk {chunk} summarized in {:?}", started.elapsed());

        if output.trim().is_empty() {
            return Err(CoreError::Summarizer {
                chunk,
                message: "summarizer returned an empty summary".into(),
            });
        }
        Ok(output)
    }
}
