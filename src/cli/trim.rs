use std::path::Path;

use anyhow::Result;

use recall::memory::trim::{count_tokens, trim as trim_turns};
use recall::RecallConfig;

/// Trim a JSON turn list and print the result as JSON. Limits default to config.
pub fn trim(
    config: &RecallConfig,
    file: &Path,
    max_rounds: Option<usize>,
    max_tokens: Option<usize>,
) -> Result<()> {
    let turns = super::read_turns(file)?;
    let max_rounds = max_rounds.unwrap_or(config.limits.max_rounds_per_session);
    let max_tokens = max_tokens.unwrap_or(config.limits.max_tokens_per_session);

    let trimmed = trim_turns(&turns, max_rounds, max_tokens);
    tracing::info!(
        before = turns.len(),
        after = trimmed.len(),
        tokens = count_tokens(&trimmed),
        max_rounds,
        max_tokens,
        "turns trimmed"
    );

    println!("{}", serde_json::to_string_pretty(&trimmed)?);
    Ok(())
}
