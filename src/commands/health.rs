use colored::*;
use eyre::{Context, Result};

use super::print_structured;
use crate::cli::OutputFormat;
use crate::client::HttpClient;
use crate::models::Health;

pub fn run(client: &HttpClient, format: OutputFormat) -> Result<()> {
    let health: Health = client.get("/health", None).context("Health check failed")?;

    if print_structured(&health, format)? {
        return Ok(());
    }

    println!("{}", "API Health".bold());
    let status = if health.status == "ok" {
        health.status.green()
    } else {
        health.status.yellow()
    };
    println!("  status: {}", status);
    println!("  base:   {}", client.base_url().dimmed());

    Ok(())
}
