pub mod browse;
pub mod completions;
pub mod config;
pub mod health;
pub mod retrieve;
pub mod store;
pub mod structured;
pub mod user;

use serde::Serialize;

use crate::cli::OutputFormat;

/// Print a structured value for the machine-readable formats.
///
/// Returns `false` for text, leaving rendering to the command.
pub(crate) fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> eyre::Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
        OutputFormat::Text => Ok(false),
    }
}
