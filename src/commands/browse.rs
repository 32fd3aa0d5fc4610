use colored::*;
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::print_structured;
use super::retrieve::{self, RetrieveQuery};
use crate::cli::OutputFormat;
use crate::client::HttpClient;
use crate::models::MemoryItem;

pub struct BrowseOptions<'a> {
    pub layer: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
    /// `Some(None)` exports to the default file name
    pub export: Option<Option<&'a Path>>,
}

pub fn run(client: &HttpClient, user_id: &str, opts: BrowseOptions, format: OutputFormat) -> Result<()> {
    // No query: the API returns every memory for the user
    let query = RetrieveQuery {
        query: None,
        layer: opts.layer,
        kind: opts.kind,
        limit: opts.limit,
        offset: opts.offset,
    };
    let result = retrieve::fetch(client, user_id, &query)?;

    if let Some(target) = opts.export {
        let path = target.map(Path::to_path_buf).unwrap_or_else(|| default_export_path(user_id));
        export(&result.results, &path)?;
        eprintln!("{} Exported {} memories to {}", "✓".green(), result.results.len(), path.display());
    }

    if print_structured(&result, format)? {
        return Ok(());
    }

    println!("{}", "Memory Browser".bold());
    println!();
    for item in &result.results {
        println!("  {}", item.content.bold());
        println!("    {}", format!("{} · {} · {}", item.layer, item.kind, item.id).dimmed());
    }

    Ok(())
}

pub fn default_export_path(user_id: &str) -> PathBuf {
    PathBuf::from(format!("memories_{}.json", user_id))
}

fn export(items: &[MemoryItem], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("Failed to create export directory")?;
    }
    let json = serde_json::to_string_pretty(items).context("Failed to serialize memories")?;
    fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
    log::info!("Exported {} memories to {}", items.len(), path.display());
    Ok(())
}
