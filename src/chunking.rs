use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Tokenizer;

pub const DEFAULT_CHUNK_WORD_LIMIT: usize = 900;

/// How chunk boundaries are bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Groups of at most `chunk_word_limit` words. Cheap, but a token-dense
    /// group can overshoot the model budget.
    Words,
    /// Word groups shrunk until each tokenizes to at most the token budget.
    #[default]
    Tokens,
}

/// How much of a long document reaches the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    /// Chunk the whole document.
    #[default]
    Full,
    /// Keep only the first `token_budget` tokens, then chunk those.
    Budget,
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkStrategy::Words => write!(f, "words"),
            ChunkStrategy::Tokens => write!(f, "tokens"),
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coverage::Full => write!(f, "full"),
            Coverage::Budget => write!(f, "budget"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Maximum tokens a single summarizer call accepts.
    pub token_budget: usize,
    pub chunk_word_limit: usize,
    pub strategy: ChunkStrategy,
    pub coverage: Coverage,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            token_budget: crate::model::models::DEFAULT_TOKEN_BUDGET,
            chunk_word_limit: DEFAULT_CHUNK_WORD_LIMIT,
            strategy: ChunkStrategy::default(),
            coverage: Coverage::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Word offsets into the source word sequence, end exclusive.
    pub start_word: usize,
    pub end_word: usize,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word
    }
}

/// Ordered, non-overlapping word slices covering a text from first word to last.
#[derive(Debug, Clone, Default)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// Partition `text` into consecutive word groups.
    ///
    /// With [`ChunkStrategy::Tokens`] a group that tokenizes above the budget is
    /// shrunk in proportion to its overshoot and re-measured. A single word
    /// that is over budget on its own still becomes a chunk.
    pub fn build(text: &str, opts: &ChunkOptions, tokenizer: &dyn Tokenizer) -> Result<Self, CoreError> {
        if opts.chunk_word_limit == 0 {
            return Err(CoreError::input("chunk_word_limit must be at least 1"));
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < words.len() {
            let mut end = (start + opts.chunk_word_limit).min(words.len());

            if opts.strategy == ChunkStrategy::Tokens {
                loop {
                    let n = end - start;
                    let tokens = tokenizer.count(&words[start..end].join(" "))?;
                    if tokens <= opts.token_budget {
                        break;
                    }
                    if n == 1 {
                        tracing::warn!(
                            "Word at offset {start} alone is {tokens} tokens (budget {}); sending as-is",
                            opts.token_budget
                        );
                        break;
                    }
                    let scaled = n * opts.token_budget / tokens;
                    end = start + scaled.clamp(1, n - 1);
                }
            }

            chunks.push(Chunk {
                index: chunks.len(),
                text: words[start..end].join(" "),
                start_word: start,
                end_word: end,
            });
            start = end;
        }

        Ok(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn word_count(&self) -> usize {
        self.chunks.iter().map(Chunk::word_count).sum()
    }
}

impl<'a> IntoIterator for &'a ChunkPlan {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordTokenizer;

    /// Two tokens per word, to push word groups over budget.
    struct DoubleTokenizer;

    impl Tokenizer for DoubleTokenizer {
        fn count(&self, text: &str) -> Result<usize, CoreError> {
            Ok(text.split_whitespace().count() * 2)
        }
        fn truncate(&self, text: &str, max_tokens: usize) -> Result<(String, usize), CoreError> {
            let kept = text.split_whitespace().take(max_tokens / 2).collect::<Vec<_>>().join(" ");
            Ok((kept, self.count(text)?))
        }
        fn name(&self) -> &str {
            "double"
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn opts(strategy: ChunkStrategy, limit: usize, budget: usize) -> ChunkOptions {
        ChunkOptions {
            token_budget: budget,
            chunk_word_limit: limit,
            strategy,
            coverage: Coverage::Full,
        }
    }

    #[test]
    fn word_strategy_splits_by_limit() {
        let plan = ChunkPlan::build(&words(2000), &opts(ChunkStrategy::Words, 900, 1024), &WordTokenizer::new()).unwrap();
        let sizes: Vec<usize> = plan.iter().map(Chunk::word_count).collect();
        assert_eq!(sizes, vec![900, 900, 200]);
        assert_eq!(plan.word_count(), 2000);
    }

    #[test]
    fn chunks_are_contiguous_and_ordered() {
        let text = words(25);
        let plan = ChunkPlan::build(&text, &opts(ChunkStrategy::Words, 7, 1024), &WordTokenizer::new()).unwrap();
        let mut expected_start = 0;
        for (i, chunk) in plan.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.start_word, expected_start);
            expected_start = chunk.end_word;
        }
        assert_eq!(expected_start, 25);

        let rejoined: Vec<&str> = plan.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn token_strategy_matches_words_when_groups_fit() {
        let text = words(2000);
        let a = ChunkPlan::build(&text, &opts(ChunkStrategy::Words, 900, 1024), &WordTokenizer::new()).unwrap();
        let b = ChunkPlan::build(&text, &opts(ChunkStrategy::Tokens, 900, 1024), &WordTokenizer::new()).unwrap();
        assert_eq!(a.chunks(), b.chunks());
    }

    #[test]
    fn token_strategy_shrinks_dense_groups() {
        let plan = ChunkPlan::build(&words(1000), &opts(ChunkStrategy::Tokens, 900, 1024), &DoubleTokenizer).unwrap();
        for chunk in &plan {
            assert!(chunk.word_count() * 2 <= 1024, "chunk {} too large", chunk.index);
        }
        assert_eq!(plan.word_count(), 1000);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn oversized_single_word_is_kept() {
        let plan = ChunkPlan::build("a b c", &opts(ChunkStrategy::Tokens, 3, 1), &DoubleTokenizer).unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|c| c.word_count() == 1));
    }

    #[test]
    fn empty_text_gives_empty_plan() {
        let plan = ChunkPlan::build("  \n ", &ChunkOptions::default(), &WordTokenizer::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = ChunkPlan::build("a b", &opts(ChunkStrategy::Words, 0, 10), &WordTokenizer::new()).unwrap_err();
        assert_eq!(err.kind(), "input_error");
    }
}
