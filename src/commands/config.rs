use colored::*;
use eyre::{Context, Result};
use std::fs;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, LogLevel};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => {
            println!("{}", get(&key, config)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => set(&key, &value, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "memdev Configuration".bold());
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
            println!();

            println!("{}:", "api".cyan());
            println!(
                "  base_url: {}",
                config.api.base_url.as_deref().unwrap_or("(resolved from origin)")
            );
            println!("  origin: {}", config.api.origin);
            println!();

            println!("{}:", "paths".cyan());
            println!("  state: {}", config.paths.state.display());
            println!();

            println!("{}:", "console".cyan());
            println!("  live: {}", config.console.live);
            println!("  show_on_exit: {}", config.console.show_on_exit);
        }
    }

    Ok(())
}

fn get(key: &str, config: &Config) -> Result<String> {
    let value = match key {
        "log_level" | "log-level" => config.log_level.as_filter().to_string(),
        "api.base_url" => config.api.base_url.clone().unwrap_or_default(),
        "api.origin" => config.api.origin.clone(),
        "paths.state" => config.paths.state.display().to_string(),
        "console.live" => config.console.live.to_string(),
        "console.show_on_exit" => config.console.show_on_exit.to_string(),
        _ => eyre::bail!("Unknown config key: {}", key),
    };
    Ok(value)
}

/// Apply `key = value` to a copy of `config`
fn apply(key: &str, value: &str, config: &Config) -> Result<Config> {
    let mut new_config = config.clone();

    match key {
        "log_level" | "log-level" => new_config.log_level = value.parse::<LogLevel>()?,
        "api.base_url" => {
            new_config.api.base_url = if value.trim().is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "api.origin" => {
            url::Url::parse(value).context(format!("Invalid origin URL: {}", value))?;
            new_config.api.origin = value.to_string();
        }
        "paths.state" => new_config.paths.state = value.into(),
        "console.live" => {
            new_config.console.live = value.parse().context("Invalid boolean value (use 'true' or 'false')")?;
        }
        "console.show_on_exit" => {
            new_config.console.show_on_exit =
                value.parse().context("Invalid boolean value (use 'true' or 'false')")?;
        }
        _ => {
            eyre::bail!("Unknown config key: {}", key);
        }
    }

    Ok(new_config)
}

fn set(key: &str, value: &str, config: &Config) -> Result<()> {
    println!("{} Setting {} = {}", "→".blue(), key.cyan(), value.green());

    let new_config = apply(key, value, config)?;

    let config_path = Config::memdev_dir().join("memdev.yaml");
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml_str = serde_yaml::to_string(&new_config).context("Failed to serialize config")?;
    fs::write(&config_path, yaml_str).context("Failed to write config file")?;

    println!("  {} Saved to {}", "✓".green(), config_path.display());

    Ok(())
}
