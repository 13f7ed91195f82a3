use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunking::{ChunkOptions, ChunkStrategy, Coverage, DEFAULT_CHUNK_WORD_LIMIT};
use crate::model::models::{self, SummaryModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model registry id, e.g. "bart-large-cnn".
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub backend: Backend,

    /// Base URL of a HuggingFace-compatible inference API. The model's
    /// inference id is appended.
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    /// Bearer token for the inference API. Falls back to `HF_TOKEN`.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Overrides the registry's token budget for the selected model.
    #[serde(default)]
    pub token_budget: Option<usize>,

    #[serde(default = "default_chunk_word_limit")]
    pub chunk_word_limit: usize,

    #[serde(default)]
    pub chunk_strategy: ChunkStrategy,

    #[serde(default)]
    pub coverage: Coverage,

    /// Per summarizer call. 0 disables the timeout.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Caps in-flight summarizer calls across all requests.
    #[serde(default)]
    pub max_concurrent_calls: Option<usize>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Bearer token for the localhost REST API. Unset means no auth.
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub lengths: LengthBounds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted inference over HTTP.
    #[default]
    Http,
    /// Offline extractive lead summary.
    Lead,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Http => write!(f, "http"),
            Backend::Lead => write!(f, "lead"),
        }
    }
}

/// Allowed range and default for one request parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Range {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthBounds {
    #[serde(default = "default_max_length_range")]
    pub max_length: Range,
    #[serde(default = "default_min_length_range")]
    pub min_length: Range,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            max_length: default_max_length_range(),
            min_length: default_min_length_range(),
        }
    }
}

fn default_port() -> u16 {
    7438
}

fn default_model() -> String {
    models::default_model().id.to_string()
}

fn default_inference_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_chunk_word_limit() -> usize {
    DEFAULT_CHUNK_WORD_LIMIT
}

fn default_call_timeout() -> u64 {
    120
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_max_length_range() -> Range {
    Range { min: 50, max: 500, default: 200 }
}

fn default_min_length_range() -> Range {
    Range { min: 10, max: 100, default: 50 }
}

impl Config {
    pub fn data_dir() -> Result<PathBuf> {
        let dir = dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".condense");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("config.toml"))
    }

    pub fn pid_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("condense.pid"))
    }

    pub fn model_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?.join("models");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, &contents)?;

        // Owner-only: the file may hold API tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn model_info(&self) -> Result<&'static SummaryModel> {
        models::get_model(&self.model)
            .with_context(|| format!("Model '{}' not found in registry. See `condense model list`.", self.model))
    }

    /// Config override, else the registry entry, else the library default.
    pub fn token_budget(&self) -> usize {
        self.token_budget
            .or_else(|| models::get_model(&self.model).map(|m| m.token_budget))
            .unwrap_or(models::DEFAULT_TOKEN_BUDGET)
    }

    pub fn chunk_options(&self) -> ChunkOptions {
        ChunkOptions {
            token_budget: self.token_budget(),
            chunk_word_limit: self.chunk_word_limit,
            strategy: self.chunk_strategy,
            coverage: self.coverage,
        }
    }

    pub fn resolved_api_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    /// Generate an auth token for the REST API if none is set.
    pub fn ensure_auth_token(&mut self) -> Result<()> {
        if self.auth_token.is_none() {
            use rand::Rng;
            let token: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(48)
                .map(char::from)
                .collect();
            self.auth_token = Some(token);
            self.save()?;
        }
        Ok(())
    }

    pub fn daemon_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            model: default_model(),
            backend: Backend::default(),
            inference_url: default_inference_url(),
            api_token: None,
            token_budget: None,
            chunk_word_limit: default_chunk_word_limit(),
            chunk_strategy: ChunkStrategy::default(),
            coverage: Coverage::default(),
            call_timeout_secs: default_call_timeout(),
            max_concurrent_calls: None,
            max_upload_bytes: default_max_upload_bytes(),
            auth_token: None,
            lengths: LengthBounds::default(),
        }
    }
}
