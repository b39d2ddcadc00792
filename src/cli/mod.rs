//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `chatlens analyze <file>`: upload an export and show the dashboard
//! - `chatlens validate <file>`: ask the service whether a file is usable
//! - `chatlens history list|show|remove|clear`: manage saved analyses
//! - `chatlens stats`: upload attempt summary from the event log
//! - `chatlens health`: check config, storage and the analysis service
//! - `chatlens config show|init|set|reset`: configuration management

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::client::{AnalysisService, HttpAnalysisClient};
use crate::config::{self, AnalysisMode};
use crate::events::EventLog;
use crate::events::report::{self, AttemptStats};
use crate::render;
use crate::store::AppStore;
use crate::upload::{StagedFile, UploadState};

/// Output format for commands that print data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// chatlens analyze
// ---------------------------------------------------------------------------

/// Upload one export file and render the result.
pub fn run_analyze(path: &Path, basic: bool, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mode = if basic {
        AnalysisMode::Basic
    } else {
        cfg.server.mode
    };
    let client = HttpAnalysisClient::from_config(&cfg.server)
        .context("failed to create HTTP client")?;
    let mut store = AppStore::from_config(&cfg);

    let file = StagedFile::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if format == OutputFormat::Table {
        println!(
            "{} {} ({:.1} KB, {} analysis)",
            "▶".cyan().bold(),
            file.name.bold(),
            file.size_kb(),
            mode
        );
    }
    if let Err(e) = store.select_file(file) {
        if format == OutputFormat::Table {
            println!("{}", render::progress_line(store.upload_state()));
        }
        return Err(e.into());
    }

    let mut show_progress = |state: &UploadState| {
        if format == OutputFormat::Table {
            println!("{}", render::progress_line(state));
        }
    };
    let result = store
        .submit(&client, mode, &mut show_progress)
        .with_context(|| format!("analysis of {} failed", path.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => {
            println!();
            print!("{}", render::analysis(&result));
            println!();
            println!(
                "  {}",
                format!("Saved to history ({})", store.history_location()).dimmed()
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chatlens validate
// ---------------------------------------------------------------------------

pub fn run_validate(path: &Path, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = HttpAnalysisClient::from_config(&cfg.server)
        .context("failed to create HTTP client")?;
    let file = StagedFile::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let report = client
        .validate(&file)
        .context("validation request failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => println!("{}", render::validation(&file.name, &report)),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chatlens history
// ---------------------------------------------------------------------------

pub fn run_history_list(format: OutputFormat) -> Result<()> {
    let store = AppStore::from_config(&config::load());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(store.history())?),
        OutputFormat::Table => print!("{}", render::history_list(store.history())),
    }
    Ok(())
}

pub fn run_history_show(id: &str, format: OutputFormat) -> Result<()> {
    let mut store = AppStore::from_config(&config::load());
    let Some(result) = store.open_history_item(id) else {
        bail!("no saved analysis with id {id}");
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table => print!("{}", render::analysis(result)),
    }
    Ok(())
}

pub fn run_history_remove(id: &str) -> Result<()> {
    let mut store = AppStore::from_config(&config::load());
    if store
        .remove_from_history(id)
        .context("failed to update history")?
    {
        println!("{} Removed {}", "✓".green().bold(), id.bold());
    } else {
        println!("{}", format!("No saved analysis with id {id}.").yellow());
    }
    Ok(())
}

pub fn run_history_clear() -> Result<()> {
    let mut store = AppStore::from_config(&config::load());
    let count = store.history().len();
    store.clear_history().context("failed to clear history")?;
    println!("{} Cleared {} saved analyses", "✓".green().bold(), count);
    Ok(())
}

// ---------------------------------------------------------------------------
// chatlens stats
// ---------------------------------------------------------------------------

/// Show upload attempt statistics from the event log.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let log = EventLog::from_config(&cfg.logging);
    let stats = report::build_stats(&log.read_since_days(days));

    if stats.attempts == 0 {
        println!(
            "{}",
            "No data yet. Analyze a chat export to see stats.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_stats_json(&stats)?,
        OutputFormat::Table => print_stats_table(&stats),
    }
    Ok(())
}

fn print_stats_table(stats: &AttemptStats) {
    println!("{}", "chatlens Upload Report".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    println!("  {} {}", "Attempts:    ".bold(), stats.attempts);
    println!(
        "  {} {} ({:.1}%)",
        "Completed:   ".bold(),
        stats.completed,
        stats.success_pct()
    );
    println!("  {} {}", "Failed:      ".bold(), stats.failed);
    if let Some(avg) = stats.avg_latency_ms {
        println!("  {} {}ms", "Avg latency: ".bold(), render::format_number(avg));
    }
    println!(
        "  {} basic {} · advanced {}",
        "Modes:       ".bold(),
        stats.basic,
        stats.advanced
    );

    if !stats.top_errors.is_empty() {
        println!();
        println!("{}", "Most Common Errors".bold().cyan());
        for (message, count) in &stats.top_errors {
            println!("  {:>4}  {}", count, render::truncate(message, 60));
        }
    }
}

fn print_stats_json(stats: &AttemptStats) -> Result<()> {
    let value = serde_json::json!({
        "attempts": stats.attempts,
        "completed": stats.completed,
        "failed": stats.failed,
        "success_pct": stats.success_pct(),
        "avg_latency_ms": stats.avg_latency_ms,
        "modes": { "basic": stats.basic, "advanced": stats.advanced },
        "top_errors": stats.top_errors.iter().map(|(message, count)| serde_json::json!({
            "message": message,
            "count": count,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// chatlens health
// ---------------------------------------------------------------------------

/// Check config files, the history slot, the event log and the service.
pub fn run_health() -> Result<()> {
    println!("{}", "chatlens Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.chatlens/config.toml found"
        } else {
            "not found (run `chatlens config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".chatlens.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item("Analysis mode", true, &cfg.server.mode.to_string());

    let store = AppStore::from_config(&cfg);
    print_health_item(
        "History",
        true,
        &format!(
            "{} of 10 slots used ({})",
            store.history().len(),
            store.history_location()
        ),
    );

    let log = EventLog::from_config(&cfg.logging);
    match log.path() {
        Some(path) if path.exists() => print_health_item(
            "Event log",
            true,
            &format!("{} entries", log.read_all().len()),
        ),
        Some(_) => print_health_item("Event log", true, "no log file yet"),
        None => print_health_item("Event log", false, "disabled"),
    }

    let client = HttpAnalysisClient::from_config(&cfg.server)
        .context("failed to create HTTP client")?;
    match client.health() {
        Ok(health) => {
            print_health_item(
                "Analysis service",
                health.is_healthy(),
                &format!("{} at {}", health.status, client.base_url()),
            );
            print_health_item(
                "AI backend",
                health.api_configured,
                if health.api_configured {
                    "API key configured"
                } else {
                    "service has no API key"
                },
            );
        }
        Err(e) => print_health_item(
            "Analysis service",
            false,
            &format!("not reachable at {}: {}", client.base_url(), e),
        ),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// chatlens config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective chatlens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.chatlens/config.toml");
    print_source(project_exists, ".chatlens.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "CHATLENS_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.chatlens/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str_opt(Some("csv")),
            OutputFormat::Table
        );
    }
}
