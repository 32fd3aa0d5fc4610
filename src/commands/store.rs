use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::path::Path;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::client::HttpClient;
use crate::models::{Role, StoreRequest, StoreResponse, Turn};

pub fn run(
    client: &HttpClient,
    user_id: &str,
    turns: &[String],
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let history = match file {
        Some(path) => load_transcript(path)?,
        None => turns.iter().map(|t| parse_turn(t)).collect::<Result<Vec<_>>>()?,
    };

    if history.is_empty() {
        eyre::bail!("Nothing to store: pass --turn ROLE:CONTENT or --file transcript.json");
    }

    log::info!("Storing {} turns for user {}", history.len(), user_id);
    let request = StoreRequest {
        user_id,
        history: &history,
    };
    let response: StoreResponse = client
        .post("/v1/store", &request, None)
        .context("Store failed")?;

    if print_structured(&response, format)? {
        return Ok(());
    }

    println!("{} memories_created: {}", "✓".green(), response.memories_created.to_string().bold());

    let counters = [
        ("duplicates_avoided", response.duplicates_avoided),
        ("updates_made", response.updates_made),
        ("existing_checked", response.existing_memories_checked),
    ];
    let present: Vec<String> = counters
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("{} {}", name, v)))
        .collect();
    if !present.is_empty() {
        println!("  {}", present.join(" · ").dimmed());
    }

    if let Some(ref summary) = response.summary {
        println!("  {}", summary);
    }
    for id in &response.ids {
        println!("  {}", id.dimmed());
    }

    Ok(())
}

/// Parse `ROLE:CONTENT`; content may itself contain colons
fn parse_turn(raw: &str) -> Result<Turn> {
    let (role, content) = raw
        .split_once(':')
        .ok_or_else(|| eyre::eyre!("Invalid turn '{}': expected ROLE:CONTENT", raw))?;
    let role: Role = role.parse()?;

    Ok(Turn {
        role,
        content: content.trim_start().to_string(),
    })
}

fn load_transcript(path: &Path) -> Result<Vec<Turn>> {
    let content = fs::read_to_string(path).context(format!("Failed to read transcript {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse transcript {}", path.display()))
}
