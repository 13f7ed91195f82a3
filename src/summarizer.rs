use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::models::SummaryModel;

/// Output length bounds forwarded to the model on every call.
///
/// `min_length < max_length` is expected but not checked here; the model
/// decides what an inverted range means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthParams {
    pub max_length: usize,
    pub min_length: usize,
}

/// Black-box text-to-text summarization. Decoding is always greedy
/// (no sampling), so identical input gives identical output.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, params: LengthParams) -> Result<String>;

    fn name(&self) -> &str;
}

// ── Hosted inference ─────────────────────────────────────────

/// Summarization over a HuggingFace-compatible inference endpoint.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    input_prefix: Option<&'static str>,
    name: String,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Summaries(Vec<SummaryItem>),
    Failure { error: String },
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

impl HttpSummarizer {
    pub fn new(base_url: &str, model: &SummaryModel, api_token: Option<String>) -> Result<Self> {
        let base = url::Url::parse(base_url).with_context(|| format!("Invalid inference_url: {base_url}"))?;
        let endpoint = format!("{}/{}", base.as_str().trim_end_matches('/'), model.inference_id);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_token,
            input_prefix: model.input_prefix,
            name: model.id.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str, params: LengthParams) -> Result<String> {
        let prefixed;
        let inputs = match self.input_prefix {
            Some(prefix) => {
                prefixed = format!("{prefix}{text}");
                prefixed.as_str()
            }
            None => text,
        };

        let body = InferenceRequest {
            inputs,
            parameters: InferenceParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                do_sample: false,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach inference endpoint {}", self.endpoint))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .context("Failed to read inference response body")?;

        parse_inference_body(status, &raw)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn parse_inference_body(status: reqwest::StatusCode, raw: &str) -> Result<String> {
    let parsed = serde_json::from_str::<InferenceResponse>(raw);

    if !status.is_success() {
        let detail = match parsed {
            Ok(InferenceResponse::Failure { error }) => error,
            _ => raw.chars().take(200).collect(),
        };
        anyhow::bail!("HTTP {status} from inference endpoint: {detail}");
    }

    match parsed.context("Malformed inference response")? {
        InferenceResponse::Summaries(items) => items
            .into_iter()
            .next()
            .map(|item| item.summary_text)
            .context("Inference response contained no summaries"),
        InferenceResponse::Failure { error } => anyhow::bail!("Inference endpoint error: {error}"),
    }
}

// ── Offline fallback ─────────────────────────────────────────

/// Extractive lead summary: leading sentences until `min_length` words are
/// collected, never more than `max_length` words. Lengths count words.
pub struct LeadSummarizer;

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize(&self, text: &str, params: LengthParams) -> Result<String> {
        let mut out: Vec<&str> = Vec::new();

        for sentence in split_sentences(text) {
            if out.len() >= params.min_length.max(1) {
                break;
            }
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let room = params.max_length.saturating_sub(out.len());
            if words.len() > room {
                out.extend_from_slice(&words[..room]);
                break;
            }
            out.extend(words);
        }

        if out.is_empty() {
            anyhow::bail!("No sentences to extract");
        }
        Ok(out.join(" "))
    }

    fn name(&self) -> &str {
        "lead"
    }
}

/// Split on `.`, `!` or `?` followed by whitespace or end of text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
