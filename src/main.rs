use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod client;
mod commands;
mod config;
mod devlog;
mod models;
mod session;

use cli::{Cli, Commands, OutputFormat};
use client::HttpClient;
use commands::browse::BrowseOptions;
use commands::retrieve::RetrieveQuery;
use config::{Config, LogLevel};
use devlog::{EventLog, console};

/// File logger under the local data dir; `RUST_LOG` overrides the configured level
fn setup_logging(log_level: &LogLevel) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memdev")
        .join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("memdev.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .context("Failed to open log file")?;

    let from_env = std::env::var("RUST_LOG").is_ok();
    let mut builder = env_logger::Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.parse_filters(log_level.as_filter());
    }
    builder.target(env_logger::Target::Pipe(Box::new(file))).init();

    info!(
        "memdev {} logging at {} (from {})",
        env!("GIT_DESCRIBE"),
        log_level.as_filter(),
        if from_env { "RUST_LOG" } else { "config" }
    );
    Ok(log_file)
}

fn dispatch(cli: Cli, config: &Config, log: &Arc<EventLog>) -> Result<()> {
    let Cli {
        base_url,
        user_id,
        command,
        ..
    } = cli;
    let state_dir = Config::expand_path(&config.paths.state);

    // Base address is resolved once per run, and only for commands that talk to the API
    let client = || -> Result<HttpClient> {
        let base = config.resolve_base_url(base_url.as_deref())?;
        Ok(HttpClient::new(base, Arc::clone(log)))
    };
    let user = || session::persisted_user_id(user_id.as_deref(), &state_dir);

    match command {
        Commands::Health { format } => commands::health::run(&client()?, OutputFormat::resolve(format)),
        Commands::Retrieve {
            query,
            layer,
            kind,
            limit,
            offset,
            metadata,
            format,
        } => {
            let query = RetrieveQuery {
                query: query.as_deref(),
                layer: layer.as_deref(),
                kind: kind.as_deref(),
                limit,
                offset,
            };
            commands::retrieve::run(&client()?, &user()?, query, metadata, OutputFormat::resolve(format))
        }
        Commands::Store { turns, file, format } => commands::store::run(
            &client()?,
            &user()?,
            &turns,
            file.as_deref(),
            OutputFormat::resolve(format),
        ),
        Commands::Structured { query, format } => {
            commands::structured::run(&client()?, &user()?, &query, OutputFormat::resolve(format))
        }
        Commands::Browse {
            layer,
            kind,
            limit,
            offset,
            export,
            format,
        } => {
            let opts = BrowseOptions {
                layer: layer.as_deref(),
                kind: kind.as_deref(),
                limit,
                offset,
                export: export.as_ref().map(|path| path.as_deref()),
            };
            commands::browse::run(&client()?, &user()?, opts, OutputFormat::resolve(format))
        }
        Commands::User { action } => commands::user::run(action, user_id.as_deref(), &state_dir),
        Commands::Config { action } => commands::config::run(action, config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let log = Arc::new(EventLog::new());
    let live = (cli.live || config.console.live).then(|| console::attach_live(&log));
    let show_console = cli.console || config.console.show_on_exit;

    let result = dispatch(cli, &config, &log);

    if let Some(subscription) = live {
        subscription.unsubscribe();
    }
    if !log.is_empty() {
        info!("{} requests recorded this run", log.len());
    }
    // Printed on failure too
    if show_console {
        console::print_table(&log);
    }

    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let log_file = setup_logging(&config.log_level).context("Failed to setup logging")?;
    info!("Writing log to {}, config from {:?}", log_file.display(), cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
