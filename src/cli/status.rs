use anyhow::Result;
use std::time::Duration;

use crate::config::Config;
use crate::model;

pub async fn run(cfg: &Config) -> Result<()> {
    println!("condense v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let pid_running = Config::pid_path().ok().and_then(|p| crate::daemon::live_pid(&p));

    let healthy = daemon_healthy(cfg).await;
    let daemon_status = match (&pid_running, healthy) {
        (Some(pid), true) => format!("running (pid {pid}) ✓"),
        (None, true) => "running ✓".to_string(),
        (Some(pid), false) => format!("pid {pid} present but not answering"),
        (None, false) => "stopped".to_string(),
    };

    println!("Daemon:          {daemon_status}");
    if healthy {
        println!("  REST API:      {}/v1/", cfg.daemon_url());
    }
    println!();

    println!("Model:           {}", cfg.model);
    println!("Backend:         {}", cfg.backend);
    println!("Token budget:    {}", cfg.token_budget());
    println!("Chunking:        {} words, {} strategy, {} coverage", cfg.chunk_word_limit, cfg.chunk_strategy, cfg.coverage);
    let tokenizer = model::tokenizer_path(&cfg.model)?;
    println!(
        "Tokenizer:       {}",
        if tokenizer.exists() { "downloaded" } else { "missing (whitespace fallback)" }
    );
    println!();
    println!("Data dir:        {}", Config::data_dir()?.display());

    if !healthy {
        println!();
        println!("💡 Start daemon: condense start");
    }

    Ok(())
}

pub(crate) async fn daemon_healthy(cfg: &Config) -> bool {
    let Ok(client) = reqwest::Client::builder().timeout(Duration::from_secs(2)).build() else {
        return false;
    };
    client
        .get(format!("{}/health", cfg.daemon_url()))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}
