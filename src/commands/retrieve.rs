use colored::*;
use eyre::{Context, Result};
use url::form_urlencoded;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::client::HttpClient;
use crate::models::{MemoryItem, RetrieveResult};

/// Filters for `/v1/retrieve`; empty values are left out of the query string
#[derive(Debug, Clone, Default)]
pub struct RetrieveQuery<'a> {
    pub query: Option<&'a str>,
    pub layer: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
}

impl RetrieveQuery<'_> {
    /// Root-relative request path including the encoded query string
    pub fn path(&self, user_id: &str) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("user_id", user_id);
        for (key, value) in [("query", self.query), ("layer", self.layer), ("type", self.kind)] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                params.append_pair(key, value);
            }
        }
        params.append_pair("limit", &self.limit.to_string());
        params.append_pair("offset", &self.offset.to_string());
        format!("/v1/retrieve?{}", params.finish())
    }
}

pub fn run(
    client: &HttpClient,
    user_id: &str,
    query: RetrieveQuery,
    show_metadata: bool,
    format: OutputFormat,
) -> Result<()> {
    let result = fetch(client, user_id, &query)?;

    if print_structured(&result, format)? {
        return Ok(());
    }

    println!("{}", "Retrieve".bold());
    println!("{}", format!("{} results", result.results.len()).dimmed());
    println!();
    for item in &result.results {
        print_item(item, show_metadata);
    }

    Ok(())
}

pub(crate) fn fetch(client: &HttpClient, user_id: &str, query: &RetrieveQuery) -> Result<RetrieveResult> {
    let path = query.path(user_id);
    client
        .get(&path, None)
        .context(format!("Retrieve failed for user {}", user_id))
}

fn print_item(item: &MemoryItem, show_metadata: bool) {
    match item.score {
        Some(score) => println!("  {} {}", item.content.bold(), format!("score {:.2}", score).dimmed()),
        None => println!("  {}", item.content.bold()),
    }
    println!("    {}", format!("{} · {}", item.layer, item.kind).dimmed());

    if show_metadata && let Some(ref metadata) = item.metadata {
        let pretty = serde_json::to_string_pretty(metadata).unwrap_or_default();
        for line in pretty.lines() {
            println!("    {}", line.dimmed());
        }
    }
}
