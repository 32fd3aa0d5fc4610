use colored::*;
use eyre::{Context, Result};

use super::print_structured;
use crate::cli::OutputFormat;
use crate::client::HttpClient;
use crate::models::{STRUCTURED_CATEGORIES, StructuredRequest, StructuredResponse};

pub fn run(client: &HttpClient, user_id: &str, query: &str, format: OutputFormat) -> Result<()> {
    let request = StructuredRequest { user_id, query };
    let response: StructuredResponse = client
        .post("/v1/retrieve/structured", &request, None)
        .context("Structured retrieve failed")?;

    if print_structured(&response, format)? {
        return Ok(());
    }

    println!("{}", "Structured Retrieve".bold());
    println!();
    print!("{}", render(&response));

    Ok(())
}

/// Text rendering of the known categories, in display order
fn render(response: &StructuredResponse) -> String {
    let mut out = String::new();
    for category in STRUCTURED_CATEGORIES {
        let items = response.get(category).map(Vec::as_slice).unwrap_or_default();
        out.push_str(&format!("{} ({})\n", category.cyan(), items.len()));
        if items.is_empty() {
            out.push_str(&format!("  {}\n", "No items.".dimmed()));
        }
        for item in items {
            out.push_str(&format!("  {}\n", item.content));
            out.push_str(&format!("    {}\n", item.id.dimmed()));
        }
    }
    out
}
