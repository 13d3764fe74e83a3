//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Discord Chat Fetcher Configuration
# Auto-generated - edit as needed

[fetch]
# Messages fetched when no count is given
default_count = 1000

[storage]
# Where exports are written (defaults to ~/Discord_Chat_Fetcher_Messages)
# save_dir = "/custom/path"

# Token source when DISCORD_TOKEN is not set: "file", "env" or "keyring"
# ("keyring" needs a build with the keyring feature)
credential_storage = "file"

[api]
base_url = "https://discord.com/api/v9"
locale = "en-US"
timezone = "UTC"
timeout_secs = 30

[pacing]
# Pause before listing each server's channels
guild_delay_ms = 500

# Pause between message batches
batch_delay_ms = 200

# Attempts per request (rate limits and transient failures)
max_attempts = 3
transient_pause_ms = 1000

# Backoff when a rate-limit response has no retry-after header
default_retry_after_ms = 1000
"#;

/// Load configuration from `path`, or the default location.
///
/// A missing file yields the defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns the path and whether it was created.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        return Ok((config_path, false));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok((config_path, true))
}

/// Render a configuration as TOML.
///
/// # Errors
/// Returns error if serialization fails.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })
}
