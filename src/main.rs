use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use chatlens::cli::{self, OutputFormat};
use chatlens::{config, web};

#[derive(Debug, Parser)]
#[command(name = "chatlens")]
#[command(about = "Analyze chat exports with a remote AI service and keep the last ten results")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a chat export (.txt) and show the analysis
    Analyze {
        /// Path to the exported chat transcript
        file: PathBuf,
        /// Use the basic endpoint instead of the configured mode
        #[arg(long)]
        basic: bool,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the service whether a file is a usable export
    Validate {
        file: PathBuf,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Saved analyses (most recent first, at most ten)
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Upload attempt statistics from the event log
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Check config, storage and the analysis service
    Health,
    /// Launch the local web dashboard
    Web {
        /// Address to bind (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    /// List saved analyses
    List {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one saved analysis
    Show {
        id: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Remove one saved analysis
    Remove { id: String },
    /// Remove every saved analysis
    Clear,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.chatlens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `server.base_url http://host:8000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn format(s: &str) -> OutputFormat {
    OutputFormat::from_str_opt(Some(s))
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Analyze {
            file,
            basic,
            format: fmt,
        } => cli::run_analyze(&file, basic, format(&fmt)),
        Commands::Validate { file, format: fmt } => cli::run_validate(&file, format(&fmt)),
        Commands::History { action } => match action {
            HistoryAction::List { format: fmt } => cli::run_history_list(format(&fmt)),
            HistoryAction::Show { id, format: fmt } => cli::run_history_show(&id, format(&fmt)),
            HistoryAction::Remove { id } => cli::run_history_remove(&id),
            HistoryAction::Clear => cli::run_history_clear(),
        },
        Commands::Stats { format: fmt, days } => cli::run_stats(format(&fmt), days),
        Commands::Health => cli::run_health(),
        Commands::Web { addr } => {
            let cfg = config::load();
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            web::serve(cfg, &addr)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
