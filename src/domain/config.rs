//! Configuration schema.
//!
//! Every field has a default so a partial (or missing) config file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the session token is read from when `DISCORD_TOKEN` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStorage {
    /// Token file in the data directory.
    #[default]
    File,
    /// Environment only (`DISCORD_TOKEN`, optionally via `.env`).
    Env,
    /// OS keyring; needs the `keyring` cargo feature.
    Keyring,
}

/// Fetch defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Message count used when none is given.
    #[serde(default = "default_count")]
    pub default_count: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
        }
    }
}

const fn default_count() -> usize {
    1000
}

/// Export and credential storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Root directory for exports.
    #[serde(default)]
    pub save_dir: Option<PathBuf>,

    #[serde(default)]
    pub credential_storage: CredentialStorage,
}

/// Remote API endpoint and the identity headers sent with every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            timezone: default_timezone(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://discord.com/api/v9".into()
}

fn default_locale() -> String {
    "en-US".into()
}

fn default_timezone() -> String {
    "UTC".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36".into()
}

const fn default_timeout() -> u64 {
    30
}

/// Pacing and retry policy, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause before each per-guild channel listing.
    #[serde(default = "default_guild_delay")]
    pub guild_delay_ms: u64,

    /// Pause between message batches.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Attempts per logical request.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts after a transient failure.
    #[serde(default = "default_transient_pause")]
    pub transient_pause_ms: u64,

    /// Backoff used when a 429 carries no `retry-after`.
    #[serde(default = "default_retry_after")]
    pub default_retry_after_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            guild_delay_ms: default_guild_delay(),
            batch_delay_ms: default_batch_delay(),
            max_attempts: default_max_attempts(),
            transient_pause_ms: default_transient_pause(),
            default_retry_after_ms: default_retry_after(),
        }
    }
}

const fn default_guild_delay() -> u64 {
    500
}

const fn default_batch_delay() -> u64 {
    200
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_transient_pause() -> u64 {
    1000
}

const fn default_retry_after() -> u64 {
    1000
}

impl PacingConfig {
    #[must_use]
    pub const fn guild_delay(&self) -> Duration {
        Duration::from_millis(self.guild_delay_ms)
    }

    #[must_use]
    pub const fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    #[must_use]
    pub const fn transient_pause(&self) -> Duration {
        Duration::from_millis(self.transient_pause_ms)
    }

    #[must_use]
    pub const fn default_retry_after(&self) -> Duration {
        Duration::from_millis(self.default_retry_after_ms)
    }

    /// Same policy with every pause set to zero.
    #[cfg(test)]
    #[must_use]
    pub const fn without_delays(mut self) -> Self {
        self.guild_delay_ms = 0;
        self.batch_delay_ms = 0;
        self.transient_pause_ms = 0;
        self.default_retry_after_ms = 0;
        self
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub pacing: PacingConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".discord-chat-fetcher")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Get the token file path.
    #[must_use]
    pub fn token_file_path() -> PathBuf {
        Self::default_data_dir().join("token")
    }

    /// Get the export root, using the default if not configured.
    #[must_use]
    pub fn save_dir(&self) -> PathBuf {
        self.storage.save_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Discord_Chat_Fetcher_Messages")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.fetch.default_count, 1000);
        assert_eq!(config.pacing.max_attempts, 3);
        assert_eq!(config.pacing.guild_delay(), Duration::from_millis(500));
        assert_eq!(config.pacing.batch_delay(), Duration::from_millis(200));
        assert_eq!(config.storage.credential_storage, CredentialStorage::File);
        assert_eq!(config.api.base_url, "https://discord.com/api/v9");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [pacing]
            batch_delay_ms = 50

            [storage]
            credential_storage = "env"
            save_dir = "/tmp/exports"
            "#,
        )
        .unwrap();

        assert_eq!(config.pacing.batch_delay_ms, 50);
        assert_eq!(config.pacing.guild_delay_ms, 500);
        assert_eq!(config.storage.credential_storage, CredentialStorage::Env);
        assert_eq!(config.save_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_keyring_storage_parses() {
        let config: AppConfig =
            toml::from_str("[storage]\ncredential_storage = \"keyring\"").unwrap();
        assert_eq!(config.storage.credential_storage, CredentialStorage::Keyring);
    }

    #[test]
    fn test_without_delays_keeps_attempts() {
        let pacing = PacingConfig::default().without_delays();
        assert_eq!(pacing.max_attempts, 3);
        assert_eq!(pacing.batch_delay(), Duration::ZERO);
        assert_eq!(pacing.default_retry_after(), Duration::ZERO);
    }
}
