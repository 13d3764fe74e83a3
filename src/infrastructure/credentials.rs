//! Token loading and storage.
//!
//! `DISCORD_TOKEN` (process environment or `.env`) wins; otherwise the token
//! file or the OS keyring is used, depending on the storage mode.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::domain::{AppError, CredentialStorage, Result};

use super::session::clean_token;

/// Environment variable holding the token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

#[cfg(feature = "keyring")]
const KEYRING_SERVICE: &str = "discord_chat_fetcher";
#[cfg(feature = "keyring")]
const KEYRING_USER: &str = "discord_token";

/// Loads the session token from the configured sources.
///
/// # Errors
/// Returns error if the token file exists but cannot be read, or the keyring
/// is selected but unavailable.
pub fn load_token(storage: CredentialStorage, token_file: &Path) -> Result<Option<String>> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = clean_token(&token);
        if !token.is_empty() {
            tracing::debug!("Using token from {TOKEN_ENV}");
            return Ok(Some(token));
        }
    }

    match storage {
        CredentialStorage::Env => Ok(None),
        CredentialStorage::File => read_token_file(token_file),
        CredentialStorage::Keyring => read_keyring(),
    }
}

/// Reads the token from the OS keyring; no entry yields `None`.
///
/// # Errors
/// Returns error if the keyring cannot be reached.
#[cfg(feature = "keyring")]
pub fn read_keyring() -> Result<Option<String>> {
    let entry = keyring_entry()?;
    match entry.get_password() {
        Ok(token) => {
            let token = clean_token(&token);
            Ok((!token.is_empty()).then_some(token))
        }
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(keyring_error(&e)),
    }
}

/// Stores the token in the OS keyring.
///
/// # Errors
/// Returns error if the token is empty or the keyring rejects it.
#[cfg(feature = "keyring")]
pub fn save_token_keyring(token: &str) -> Result<()> {
    let token = non_empty(token)?;
    keyring_entry()?
        .set_password(&token)
        .map_err(|e| keyring_error(&e))?;

    tracing::info!(service = KEYRING_SERVICE, "Token saved to keyring");
    Ok(())
}

#[cfg(feature = "keyring")]
fn keyring_entry() -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(|e| keyring_error(&e))
}

#[cfg(feature = "keyring")]
fn keyring_error(err: &keyring::Error) -> AppError {
    AppError::Config {
        message: format!("Keyring error: {err}"),
    }
}

/// # Errors
/// Always: this build has no keyring support.
#[cfg(not(feature = "keyring"))]
pub fn read_keyring() -> Result<Option<String>> {
    Err(keyring_unavailable())
}

/// # Errors
/// Always: this build has no keyring support.
#[cfg(not(feature = "keyring"))]
pub fn save_token_keyring(token: &str) -> Result<()> {
    non_empty(token)?;
    Err(keyring_unavailable())
}

#[cfg(not(feature = "keyring"))]
fn keyring_unavailable() -> AppError {
    AppError::Config {
        message: "credential_storage = \"keyring\" needs a build with the keyring feature".into(),
    }
}

fn non_empty(token: &str) -> Result<String> {
    let token = clean_token(token);
    if token.is_empty() {
        return Err(AppError::InvalidArgument {
            message: "token is empty".into(),
        });
    }
    Ok(token)
}

/// Reads a token file; a missing or blank file yields `None`.
///
/// # Errors
/// Returns error if the file exists but cannot be read.
pub fn read_token_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read token file: {}", path.display()), e))?;

    let token = clean_token(&content);
    Ok((!token.is_empty()).then_some(token))
}

/// Writes the token file, readable by the owner only on unix.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn save_token(path: &Path, token: &str) -> Result<()> {
    let token = non_empty(token)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| AppError::io(format!("Failed to open token file: {}", path.display()), e))?;
    file.write_all(token.as_bytes())
        .map_err(|e| AppError::io("Failed to write token file", e))?;

    tracing::info!(path = %path.display(), "Token saved");

    Ok(())
}
