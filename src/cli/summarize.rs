use anyhow::{Context, Result, anyhow};
use serde_json::json;

use super::SummarizeArgs;
use crate::config::Config;
use crate::evaluate::{self, ScoreTable};
use crate::extract;
use crate::pipeline::Pipeline;
use crate::validation::resolve_lengths;

const PREVIEW_CHARS: usize = 3000;

pub async fn run(cfg: &Config, args: SummarizeArgs) -> Result<()> {
    let params = resolve_lengths(&cfg.lengths, args.max_length, args.min_length).map_err(|e| anyhow!(e))?;
    let metrics = match args.metrics.as_deref() {
        Some(list) => evaluate::parse_metrics(list)?,
        None => Vec::new(),
    };
    let reference = match &args.reference {
        Some(path) => Some(
            std::fs::read_to_string(path).with_context(|| format!("Failed to read reference {}", path.display()))?,
        ),
        None => None,
    };

    let path = args.path.clone();
    let (kind, document) = tokio::task::spawn_blocking(move || extract::extract_file(&path))
        .await?
        .with_context(|| format!("Could not read {}", args.path.display()))?;

    if args.preview && !args.json {
        println!("── {} ({kind}) ──", args.path.display());
        println!("{}", preview(&document));
        println!();
    }

    let pipeline = Pipeline::from_config(cfg)?;
    let interactive = atty::is(atty::Stream::Stderr) && !args.json;
    if interactive {
        eprintln!("Summarizing with {} ...", pipeline.summarizer_name());
    }

    let summary = pipeline.summarize(&document, params).await?;
    let scores = match &reference {
        Some(r) => Some(evaluate::score(r, &summary.text, &metrics)?),
        None => None,
    };

    if let Some(out) = &args.output {
        std::fs::write(out, &summary.text).with_context(|| format!("Failed to write {}", out.display()))?;
        if interactive {
            eprintln!("✓ Summary written to {}", out.display());
        }
    }

    if args.json {
        let body = json!({
            "summary": summary.text,
            "chunks": summary.chunks,
            "token_count": summary.token_count,
            "truncated": summary.truncated,
            "scores": scores,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if args.output.is_none() {
        println!("{}", summary.text);
        println!();
    }
    println!(
        "Chunks: {}  Tokens: {}{}",
        summary.chunks,
        summary.token_count,
        if summary.truncated { "  (truncated to budget)" } else { "" }
    );
    if let Some(table) = &scores {
        println!();
        print_scores(table);
    }

    Ok(())
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn print_scores(table: &ScoreTable) {
    println!("{:<10} {:>9} {:>9} {:>9}", "metric", "precision", "recall", "f1");
    for (metric, s) in table.iter() {
        println!("{:<10} {:>9.4} {:>9.4} {:>9.4}", metric.to_string(), s.precision, s.recall, s.f1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_long_text() {
        let text = "é".repeat(PREVIEW_CHARS + 10);
        let p = preview(&text);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
