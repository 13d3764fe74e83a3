//! Writing fetch results to disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{AppError, FetchResult, Result};

use super::formatter::{
    format_messages_csv, format_messages_json, format_messages_text, ExportFormat,
};

/// Writes `result` under `save_dir/<safe name>/<safe name>_<timestamp>.<ext>`.
///
/// # Errors
/// Returns error if the folder cannot be created or the file written.
pub fn export_to_file(
    result: &FetchResult,
    channel_name: &str,
    format: ExportFormat,
    save_dir: &Path,
) -> Result<PathBuf> {
    let now = Local::now();
    let safe_name = safe_file_name(channel_name);

    let folder = save_dir.join(&safe_name);
    fs::create_dir_all(&folder).map_err(|e| {
        AppError::io(format!("Failed to create directory {}", folder.display()), e)
    })?;

    let path = folder.join(format!(
        "{safe_name}_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ));

    let content = match format {
        ExportFormat::Text => format_messages_text(result, channel_name),
        ExportFormat::Json => {
            format_messages_json(result, channel_name, now).map_err(AppError::json_parse)?
        }
        ExportFormat::Csv => format_messages_csv(result),
    };

    fs::write(&path, content)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;

    tracing::info!(
        channel_id = result.channel_id(),
        path = %path.display(),
        messages = result.len(),
        "Export written"
    );

    Ok(path)
}

/// Reduces a channel label to `[A-Za-z0-9_.-]`, collapsing runs of `_`.
#[must_use]
pub fn safe_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "discord_channel".to_string()
    } else {
        trimmed.to_string()
    }
}
