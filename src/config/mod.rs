/// Configuration system for chatlens.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::ChatlensConfig::default()`]
/// 2. **User global config**: `~/.chatlens/config.toml`
/// 3. **Project local config**: `.chatlens.toml` in the current directory
/// 4. **Environment variables**: `CHATLENS_*` overrides (highest precedence)
///
/// A project file replaces the global file wholesale; environment variables
/// override individual fields.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{AnalysisMode, ChatlensConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed files are ignored so a broken config never blocks an
/// upload.
pub fn load() -> ChatlensConfig {
    let mut config = ChatlensConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);

    config
}

fn load_toml_file(path: Option<PathBuf>) -> Option<ChatlensConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.chatlens`, the home of every durable file.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chatlens"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".chatlens.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CHATLENS_SERVER_URL`: analysis service base URL
/// - `CHATLENS_TIMEOUT_MS`: request timeout
/// - `CHATLENS_MODE`: `basic` or `advanced`
/// - `CHATLENS_HISTORY_PATH`: history storage slot
/// - `CHATLENS_LOGGING`: event log on/off
/// - `CHATLENS_NO_DELAY`: skip the progress pacing delays
fn apply_env_overrides(config: &mut ChatlensConfig) {
    if let Ok(val) = std::env::var("CHATLENS_SERVER_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("CHATLENS_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("CHATLENS_MODE")
        && let Some(mode) = parse_mode(&val)
    {
        config.server.mode = mode;
    }
    if let Ok(val) = std::env::var("CHATLENS_HISTORY_PATH")
        && !val.is_empty()
    {
        config.history.path = val;
    }
    if let Ok(val) = std::env::var("CHATLENS_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("CHATLENS_NO_DELAY")
        && is_truthy(&val)
    {
        config.upload.upload_delay_ms = 0;
        config.upload.completion_delay_ms = 0;
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse an analysis mode name.
pub fn parse_mode(val: &str) -> Option<AnalysisMode> {
    match val.to_ascii_lowercase().as_str() {
        "basic" | "legacy" => Some(AnalysisMode::Basic),
        "advanced" => Some(AnalysisMode::Advanced),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.chatlens/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.chatlens/ directory")?;
    }

    fs::write(&path, ChatlensConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `server.base_url`) in the global config.
///
/// Starts from the existing file, or from the serialized defaults when no
/// file exists yet.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ChatlensConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer deserialize (e.g. mode = "fancy").
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<ChatlensConfig>(&updated)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path, keeping the type of
/// the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    if let Some(section_path) = section_path {
        for part in section_path.split('.') {
            current = current
                .get_mut(part)
                .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
        }
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table at '{}'", section_path.unwrap_or("")))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
