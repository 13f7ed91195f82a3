use anyhow::{Context, Result};
use std::path::Path;

use crate::evaluate;

pub fn run(reference: &Path, generated: &Path, metrics: Option<&str>) -> Result<()> {
    let reference = std::fs::read_to_string(reference)
        .with_context(|| format!("Failed to read reference {}", reference.display()))?;
    let generated = std::fs::read_to_string(generated)
        .with_context(|| format!("Failed to read generated summary {}", generated.display()))?;

    let metrics = match metrics {
        Some(list) => evaluate::parse_metrics(list)?,
        None => Vec::new(),
    };

    let table = evaluate::score(&reference, &generated, &metrics)?;
    super::summarize::print_scores(&table);
    Ok(())
}
