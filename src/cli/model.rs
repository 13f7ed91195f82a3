use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::model::{self, models};

/// List available summarization models
pub fn list(cfg: &Config) -> Result<()> {
    println!("Available Summarization Models:\n");

    for m in models::MODELS {
        let marker = if m.id == cfg.model { " ✓" } else { "" };
        println!("  {} {}{}", m.id, m.name, marker);
        println!("    Inference:    {}", m.inference_id);
        println!("    Token budget: {}", m.token_budget);
        println!("    Size:         ~{} MB", m.size_mb);
        println!("    Description:  {}", m.description);
        if let Some(prefix) = m.input_prefix {
            println!("    Input prefix: \"{prefix}\"");
        }
        println!();
    }

    match models::get_model(&cfg.model) {
        Some(current) => println!("Current model: {} ({})", current.id, current.name),
        None => println!("Current model: {} (unknown)", cfg.model),
    }

    Ok(())
}

/// Show current model details
pub fn current(cfg: &Config) -> Result<()> {
    let Some(m) = models::get_model(&cfg.model) else {
        println!("Current model '{}' not found in registry", cfg.model);
        return Ok(());
    };

    println!("Current Model: {}", m.name);
    println!("ID:            {}", m.id);
    println!("Inference:     {}", m.inference_id);
    println!("Token budget:  {}", cfg.token_budget());
    println!("Description:   {}", m.description);

    let tokenizer_file = model::tokenizer_path(m.id)?;
    println!("\nFiles:");
    match tokenizer_file.metadata() {
        Ok(meta) => println!(
            "  Tokenizer: {} ({:.1} KB)",
            tokenizer_file.display(),
            meta.len() as f64 / 1024.0
        ),
        Err(_) => println!("  Tokenizer: {} (missing)", tokenizer_file.display()),
    }

    Ok(())
}

/// Fetch tokenizer.json for `id`, or the active model.
pub async fn download(cfg: &Config, id: Option<&str>) -> Result<()> {
    let id = id.unwrap_or(cfg.model.as_str());
    let m = models::get_model(id).with_context(|| format!("Model '{id}' not found in registry"))?;

    let dest = model::tokenizer_path(m.id)?;
    if dest.exists() {
        println!("Tokenizer for '{}' already exists", m.id);
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    println!("📥 Downloading tokenizer for {}...", m.id);
    let client = reqwest::Client::new();
    download_file(&client, m.tokenizer_url, &dest).await?;
    println!("✅ Saved to {}", dest.display());
    Ok(())
}

/// Switch the active model, fetching its tokenizer if missing.
pub async fn switch(cfg: &Config, model_id: &str) -> Result<()> {
    let m = models::get_model(model_id).with_context(|| format!("Model '{model_id}' not found in registry"))?;

    if cfg.model == model_id {
        println!("Already using model '{model_id}'");
        return Ok(());
    }

    println!("Switching from '{}' to '{}'", cfg.model, model_id);
    println!("Model: {} ({} tokens, ~{} MB)", m.name, m.token_budget, m.size_mb);
    println!();

    if let Err(e) = download(cfg, Some(model_id)).await {
        eprintln!("⚠️  Tokenizer download failed: {e:#}");
        eprintln!("   Token counting will fall back to whitespace words.");
    }

    let mut cfg = cfg.clone();
    cfg.model = model_id.to_string();
    cfg.save()?;

    println!("✅ Now using '{model_id}'");
    if super::status::daemon_healthy(&cfg).await {
        println!("   Restart the daemon to apply: condense stop && condense start");
    }
    Ok(())
}

async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} when downloading {}", response.status(), url);
    }

    let bytes = response.bytes().await.context("Failed to download response body")?;

    // A partial file must never sit at the final path
    let partial = dest.with_extension("json.part");
    fs::write(&partial, &bytes).with_context(|| format!("Failed to write file {}", partial.display()))?;
    fs::rename(&partial, dest)?;

    println!("    Downloaded {} KB", bytes.len() / 1024);
    Ok(())
}
