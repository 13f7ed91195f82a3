use thiserror::Error;

/// Failures surfaced by the summarization pipeline and the scorer.
///
/// Every variant is fatal for the request that produced it; nothing here is
/// retried automatically.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Input(String),

    #[error("summarizer failed on chunk {chunk}: {message}")]
    Summarizer { chunk: usize, message: String },

    #[error("summarizer timed out on chunk {chunk} after {secs}s")]
    Timeout { chunk: usize, secs: u64 },

    #[error("tokenization failed: {0}")]
    Tokenization(String),
}

impl CoreError {
    /// Stable identifier used in JSON responses and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Input(_) => "input_error",
            CoreError::Summarizer { .. } => "summarizer_failure",
            CoreError::Timeout { .. } => "timeout",
            CoreError::Tokenization(_) => "tokenization_failure",
        }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        CoreError::Input(msg.into())
    }
}
