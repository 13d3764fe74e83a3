//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::ExportFormat;

pub use prompt::{read_line, StdinSelector};

/// Discord Chat Fetcher - page through channel history and export it.
#[derive(Parser, Debug)]
#[command(name = "discord-chat-fetcher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ~/.discord-chat-fetcher/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the token and show the account it belongs to.
    Whoami,

    /// List reachable direct conversations and server channels.
    Channels {
        /// Only direct and group conversations.
        #[arg(long, conflicts_with = "guilds")]
        dm: bool,

        /// Only server channels.
        #[arg(long)]
        guilds: bool,
    },

    /// Fetch the newest messages of a channel by id.
    Fetch {
        /// Channel ID.
        channel_id: String,

        /// Number of messages (defaults to the configured count).
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,

        /// Label used in headers and export file names.
        #[arg(long)]
        name: Option<String>,

        /// Export to the save directory: txt, json or csv.
        #[arg(short, long)]
        export: Option<ExportFormat>,

        /// Do not print the messages.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Choose a channel interactively, then fetch it.
    Pick {
        /// Pick from direct and group conversations.
        #[arg(long, conflicts_with = "guilds")]
        dm: bool,

        /// Pick from server channels.
        #[arg(long)]
        guilds: bool,

        /// Number of messages (defaults to the configured count).
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,

        /// Export to the save directory: txt, json or csv.
        #[arg(short, long)]
        export: Option<ExportFormat>,
    },

    /// Store a token read from stdin in the token file.
    Login,

    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Write the default configuration file if missing.
    Init,
    /// Print the configuration file path.
    Path,
    /// Print the effective configuration.
    Show,
}

/// Which part of the directory a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Direct,
    Guilds,
    Both,
}

impl Scope {
    #[must_use]
    pub const fn from_flags(dm: bool, guilds: bool) -> Self {
        match (dm, guilds) {
            (true, false) => Self::Direct,
            (false, true) => Self::Guilds,
            _ => Self::Both,
        }
    }

    #[must_use]
    pub const fn includes_direct(self) -> bool {
        matches!(self, Self::Direct | Self::Both)
    }

    #[must_use]
    pub const fn includes_guilds(self) -> bool {
        matches!(self, Self::Guilds | Self::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from([
            "discord-chat-fetcher",
            "-vv",
            "fetch",
            "1234",
            "-n",
            "250",
            "--export",
            "csv",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fetch {
                channel_id,
                count,
                export,
                quiet,
                ..
            } => {
                assert_eq!(channel_id, "1234");
                assert_eq!(count, Some(250));
                assert_eq!(export, Some(ExportFormat::Csv));
                assert!(!quiet);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_negative_count_reaches_engine() {
        let cli = Cli::parse_from(["discord-chat-fetcher", "fetch", "1", "-n", "-5"]);
        assert!(matches!(cli.command, Commands::Fetch { count: Some(-5), .. }));
    }

    #[test]
    fn test_rejects_unknown_export_format() {
        assert!(Cli::try_parse_from(["discord-chat-fetcher", "fetch", "1", "-e", "xml"]).is_err());
    }

    #[test]
    fn test_dm_and_guilds_conflict() {
        let parsed =
            Cli::try_parse_from(["discord-chat-fetcher", "channels", "--dm", "--guilds"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_scope_from_flags() {
        assert_eq!(Scope::from_flags(false, false), Scope::Both);
        assert!(Scope::from_flags(true, false).includes_direct());
        assert!(!Scope::from_flags(true, false).includes_guilds());
        assert!(!Scope::from_flags(false, true).includes_direct());
    }
}
