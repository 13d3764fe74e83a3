//! Output formatting for fetched messages and channel listings.
//!
//! Supports three export formats (plain text, JSON, CSV) plus colored
//! terminal rendering and summary tables.

use chrono::{DateTime, Local, NaiveDate};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{Channel, Directory, FetchResult, Guild, Message};

const DATE_RULE: &str = "―――――";

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Human-readable text grouped by date.
    #[default]
    Text,
    /// JSON document with export metadata.
    Json,
    /// One row per message.
    Csv,
}

impl ExportFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown format: {s}. Use: txt, json, csv")),
        }
    }
}

/// Formats messages as plain text grouped by calendar date.
pub fn format_messages_text(result: &FetchResult, channel_name: &str) -> String {
    let mut out = format!("Discord Messages from {channel_name}\n");
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    let mut current_date: Option<NaiveDate> = None;

    for msg in result.messages() {
        let date = msg.timestamp.date_naive();
        if current_date != Some(date) {
            if current_date.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("\n{DATE_RULE} {} {DATE_RULE}\n\n", long_date(date)));
            current_date = Some(date);
        }

        out.push_str(&format!(
            "{} - {}: {}\n",
            msg.timestamp.format("%H:%M:%S"),
            msg.author.username,
            msg.body()
        ));

        for attachment in &msg.attachments {
            out.push_str(&format!(
                "[Attachment: {} - {}]\n",
                attachment.filename, attachment.url
            ));
        }

        out.push('\n');
    }

    out
}

#[derive(Serialize)]
struct ChannelInfo<'a> {
    channel_name: &'a str,
    export_time: String,
    message_count: usize,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    channel_info: ChannelInfo<'a>,
    messages: &'a [Message],
}

/// Formats messages as a JSON document with export metadata.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_messages_json(
    result: &FetchResult,
    channel_name: &str,
    exported_at: DateTime<Local>,
) -> Result<String, serde_json::Error> {
    let document = ExportDocument {
        channel_info: ChannelInfo {
            channel_name,
            export_time: exported_at.to_rfc3339(),
            message_count: result.len(),
        },
        messages: result.messages(),
    };

    serde_json::to_string_pretty(&document)
}

/// Formats messages as CSV, one row per message.
pub fn format_messages_csv(result: &FetchResult) -> String {
    let mut out = String::from(
        "Timestamp,Date,Time,Author,Username,Author_ID,Message,Attachments\n",
    );

    for msg in result.messages() {
        let attachments = msg
            .attachments
            .iter()
            .map(crate::domain::Attachment::descriptor)
            .collect::<Vec<_>>()
            .join("; ");

        let row = [
            msg.timestamp.to_rfc3339(),
            msg.timestamp.format("%Y-%m-%d").to_string(),
            msg.timestamp.format("%H:%M:%S").to_string(),
            msg.author.username.clone(),
            msg.author.qualified_handle(),
            msg.author.id.clone(),
            msg.body().to_string(),
            attachments,
        ];

        let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Renders messages for the terminal, grouped by date.
pub fn render_messages_terminal(result: &FetchResult, channel_name: &str) -> String {
    if result.is_empty() {
        return "No messages to display.".yellow().to_string();
    }

    let mut out = format!("{}\n", format!("Messages from {channel_name}").bold());
    let mut current_date: Option<NaiveDate> = None;

    for msg in result.messages() {
        let date = msg.timestamp.date_naive();
        if current_date != Some(date) {
            out.push_str(&format!(
                "\n{}\n\n",
                format!("{DATE_RULE} {} {DATE_RULE}", long_date(date)).bold()
            ));
            current_date = Some(date);
        }

        out.push_str(&format!(
            "{} {} {}\n",
            msg.timestamp.format("%H:%M:%S").to_string().cyan(),
            format!("{}:", msg.author.username).green().bold(),
            msg.body()
        ));

        for attachment in &msg.attachments {
            out.push_str(&format!(
                "{}\n",
                format!("📎 Attachment: {}", attachment.descriptor()).italic()
            ));
        }
    }

    out
}

/// Table of direct and group conversations.
pub fn format_direct_table(channels: &[Channel]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Name", "Type", "Channel ID"]);

    for (i, channel) in channels.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            truncate(&channel.name, 40),
            channel.kind.to_string(),
            channel.id.clone(),
        ]);
    }

    table.to_string()
}

/// Table of guilds with their readable channel counts.
pub fn format_guilds_table(directory: &Directory) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Server Name", "Channels", "Guild ID"]);

    for (i, guild) in directory.guilds.values().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            truncate(&guild.name, 40),
            format!("{} channels", guild.channels.len()),
            guild.id.clone(),
        ]);
    }

    table.to_string()
}

/// Table of one guild's channels.
pub fn format_guild_channels_table(guild: &Guild) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Channel", "Channel ID"]);

    for (i, channel) in guild.channels.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("#{}", truncate(&channel.name, 40)),
            channel.id.clone(),
        ]);
    }

    table.to_string()
}

/// `Monday, January 01, 2024`
fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

/// Quotes a CSV field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Truncates a string to max length (in chars) with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Map;

    use super::*;
    use crate::domain::{Attachment, Author};

    fn message(id: &str, ts: &str, content: Option<&str>) -> Message {
        Message {
            id: id.into(),
            timestamp: ts.parse().unwrap(),
            author: Author {
                id: "42".into(),
                username: "ferris".into(),
                discriminator: Some("0001".into()),
                global_name: None,
            },
            content: content.map(str::to_string),
            attachments: Vec::new(),
            extra: Map::new(),
        }
    }

    fn result(messages: Vec<Message>) -> FetchResult {
        FetchResult::new("c".into(), 100, messages, 0)
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world!", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Text));
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_text_groups_by_date() {
        let mut with_file = message("3", "2024-01-02T08:00:00Z", None);
        with_file.attachments.push(Attachment {
            filename: "crab.png".into(),
            url: "https://cdn/crab.png".into(),
        });
        let text = format_messages_text(
            &result(vec![
                message("1", "2024-01-01T10:00:00Z", Some("hi")),
                message("2", "2024-01-01T11:30:05Z", Some("again")),
                with_file,
            ]),
            "DM with ferris",
        );

        assert!(text.starts_with("Discord Messages from DM with ferris\n"));
        assert_eq!(text.matches(DATE_RULE).count(), 4);
        assert!(text.contains("――――― Monday, January 01, 2024 ―――――"));
        assert!(text.contains("――――― Tuesday, January 02, 2024 ―――――"));
        assert!(text.contains("11:30:05 - ferris: again\n"));
        assert!(text.contains("08:00:00 - ferris: [No text content]\n"));
        assert!(text.contains("[Attachment: crab.png - https://cdn/crab.png]\n"));
    }

    #[test]
    fn test_json_document_shape() {
        let exported_at = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut msg = message("1", "2024-01-01T10:00:00Z", Some("hi"));
        msg.extra
            .insert("embeds".into(), serde_json::json!([{"title": "t"}]));

        let json = format_messages_json(&result(vec![msg]), "general", exported_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["channel_info"]["channel_name"], "general");
        assert_eq!(value["channel_info"]["message_count"], 1);
        assert_eq!(value["messages"][0]["id"], "1");
        assert_eq!(value["messages"][0]["author"]["username"], "ferris");
        assert_eq!(value["messages"][0]["embeds"][0]["title"], "t");
    }

    #[test]
    fn test_csv_rows_and_quoting() {
        let mut msg = message("1", "2024-01-01T10:00:00Z", Some("hello, \"world\""));
        msg.attachments = vec![
            Attachment {
                filename: "a.txt".into(),
                url: "https://cdn/a".into(),
            },
            Attachment {
                filename: "b.txt".into(),
                url: "https://cdn/b".into(),
            },
        ];

        let csv = format_messages_csv(&result(vec![msg]));
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "Timestamp,Date,Time,Author,Username,Author_ID,Message,Attachments"
        );
        assert_eq!(
            lines[1],
            "2024-01-01T10:00:00+00:00,2024-01-01,10:00:00,ferris,ferris#0001,42,\"hello, \"\"world\"\"\",a.txt (https://cdn/a); b.txt (https://cdn/b)"
        );
    }

    #[test]
    fn test_terminal_empty() {
        assert!(render_messages_terminal(&result(Vec::new()), "x").contains("No messages"));
    }
}
