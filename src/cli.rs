use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "memdev",
    about = "Developer console for a memory storage and retrieval API",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/memdev/logs/memdev.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to memdev.yaml config file")]
    pub config: Option<PathBuf>,

    /// Explicit API base address (overrides MEMDEV_API_BASE_URL and config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// User id to act as; persisted for later runs
    #[arg(short, long, global = true)]
    pub user_id: Option<String>,

    /// Print the developer console table after the command
    #[arg(long, global = true)]
    pub console: bool,

    /// Print each request to stderr as it completes
    #[arg(long, global = true)]
    pub live: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check API health
    Health {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Semantic retrieve of memories
    Retrieve {
        /// Search query (omitted when empty)
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// Memory layer filter, e.g. semantic
        #[arg(long)]
        layer: Option<String>,

        /// Memory type filter, e.g. explicit
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long, default_value = "10")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,

        /// Show metadata of each result
        #[arg(long)]
        metadata: bool,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Store a conversation transcript
    Store {
        /// Turn as ROLE:CONTENT (role is user or assistant); repeatable
        #[arg(long = "turn", short = 't', value_name = "ROLE:CONTENT")]
        turns: Vec<String>,

        /// JSON file with an array of {role, content} turns
        #[arg(long, conflicts_with = "turns")]
        file: Option<PathBuf>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Structured retrieve grouped by category
    Structured {
        /// Search query
        #[arg(long, short = 'q', default_value = "")]
        query: String,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Browse all stored memories
    Browse {
        #[arg(long)]
        layer: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long, default_value = "20")]
        limit: u32,

        #[arg(long, default_value = "0")]
        offset: u32,

        /// Export results as JSON (defaults to memories_<user>.json)
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show or change the persisted user id
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Print the user id that data commands will use
    Show,

    /// Persist a new user id
    Set {
        /// New user id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (dot notation)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// New value
        value: String,
    },
}
