use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;

pub async fn start(cfg: &Config, port: u16) -> Result<()> {
    let pid_path = Config::pid_path()?;
    if let Some(pid) = live_pid(&pid_path) {
        println!("condense is already running (pid {pid}). Stop it first: condense stop");
        return Ok(());
    }

    tracing::info!("Starting condense daemon on port {port}");

    let mut cfg = cfg.clone();
    cfg.ensure_auth_token()?;

    // Tokenizer and backend are loaded once and shared by every request
    let pipeline = Arc::new(Pipeline::from_config(&cfg).context("Failed to build summarization pipeline")?);

    std::fs::write(&pid_path, std::process::id().to_string())?;

    let http_handle = tokio::spawn(crate::http::serve(cfg.clone(), pipeline, port));

    println!("condense daemon running on port {port}");
    println!("  REST API: http://127.0.0.1:{port}/v1/");
    println!("  Model:    {} ({})", cfg.model, cfg.backend);
    println!("  Auth:     Bearer token in {}", Config::config_path()?.display());
    println!("  Press Ctrl+C to stop.");

    tokio::select! {
        res = http_handle => {
            let _ = std::fs::remove_file(&pid_path);
            return res?;
        }
        sig = tokio::signal::ctrl_c() => sig?,
    }
    tracing::info!("Shutting down...");

    let _ = std::fs::remove_file(&pid_path);
    Ok(())
}

pub async fn stop(_cfg: &Config) -> Result<()> {
    let pid_path = Config::pid_path()?;
    if !pid_path.exists() {
        println!("condense is not running.");
        return Ok(());
    }

    let pid: u32 = std::fs::read_to_string(&pid_path)?
        .trim()
        .parse()
        .context("Corrupt pid file")?;

    #[cfg(unix)]
    {
        std::process::Command::new("kill").arg(pid.to_string()).output()?;
    }

    let _ = std::fs::remove_file(&pid_path);
    println!("✓ Stopped condense (pid {pid}).");
    Ok(())
}

/// Pid recorded in `path` if that process is still alive.
pub fn live_pid(path: &std::path::Path) -> Option<String> {
    let pid = std::fs::read_to_string(path).ok()?;
    let pid = pid.trim();
    std::fs::metadata(format!("/proc/{pid}")).ok().map(|_| pid.to_string())
}
