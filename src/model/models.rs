pub struct SummaryModel {
    pub id: &'static str,             // "bart-large-cnn"
    pub name: &'static str,           // "BART Large CNN (Default)"
    pub inference_id: &'static str,   // "facebook/bart-large-cnn"
    pub token_budget: usize,          // 1024
    pub size_mb: usize,               // 1630
    pub description: &'static str,
    pub tokenizer_url: &'static str,  // HuggingFace URL to tokenizer.json
    pub input_prefix: Option<&'static str>, // T5 needs "summarize: "
}

/// Used when neither the config nor the registry names a budget.
pub const DEFAULT_TOKEN_BUDGET: usize = 1024;

pub const MODELS: &[SummaryModel] = &[
    // ── BART family (1024 tokens) ────────────────────────────────────
    SummaryModel {
        id: "bart-large-cnn",
        name: "BART Large CNN (Default)",
        inference_id: "facebook/bart-large-cnn",
        token_budget: 1024,
        size_mb: 1630,
        description: "News-style abstractive summaries. Strong default for prose and reports.",
        tokenizer_url: "https://huggingface.co/facebook/bart-large-cnn/resolve/main/tokenizer.json",
        input_prefix: None,
    },
    SummaryModel {
        id: "distilbart-cnn-12-6",
        name: "DistilBART CNN 12-6",
        inference_id: "sshleifer/distilbart-cnn-12-6",
        token_budget: 1024,
        size_mb: 1220,
        description: "Distilled BART. Faster with a small quality drop.",
        tokenizer_url: "https://huggingface.co/sshleifer/distilbart-cnn-12-6/resolve/main/tokenizer.json",
        input_prefix: None,
    },
    SummaryModel {
        id: "bart-large-cnn-samsum",
        name: "BART Large CNN SAMSum",
        inference_id: "philschmid/bart-large-cnn-samsum",
        token_budget: 1024,
        size_mb: 1630,
        description: "Fine-tuned on dialogues. Better for meeting notes and chat transcripts.",
        tokenizer_url: "https://huggingface.co/philschmid/bart-large-cnn-samsum/resolve/main/tokenizer.json",
        input_prefix: None,
    },

    // ── T5 family (512 tokens) ───────────────────────────────────────
    SummaryModel {
        id: "t5-small",
        name: "T5 Small",
        inference_id: "google-t5/t5-small",
        token_budget: 512,
        size_mb: 242,
        description: "Tiny and fast. Shorter context, so long documents split into more chunks.",
        tokenizer_url: "https://huggingface.co/google-t5/t5-small/resolve/main/tokenizer.json",
        input_prefix: Some("summarize: "),
    },
    SummaryModel {
        id: "t5-base",
        name: "T5 Base",
        inference_id: "google-t5/t5-base",
        token_budget: 512,
        size_mb: 892,
        description: "Better T5 quality at moderate size.",
        tokenizer_url: "https://huggingface.co/google-t5/t5-base/resolve/main/tokenizer.json",
        input_prefix: Some("summarize: "),
    },
];

pub fn get_model(id: &str) -> Option<&'static SummaryModel> {
    MODELS.iter().find(|m| m.id == id)
}

pub fn default_model() -> &'static SummaryModel {
    &MODELS[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_bart() {
        let m = default_model();
        assert_eq!(m.id, "bart-large-cnn");
        assert_eq!(m.token_budget, DEFAULT_TOKEN_BUDGET);
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in MODELS.iter().enumerate() {
            for b in &MODELS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn t5_carries_prefix() {
        assert_eq!(get_model("t5-small").unwrap().input_prefix, Some("summarize: "));
        assert!(get_model("nope").is_none());
    }
}
