//! Application layer - the message-retrieval engine and its formatters.
//!
//! Transport → Paginator → Assembler, with the Directory feeding channel
//! choices and the formatters/exporter consuming the result.

pub mod assembler;
pub mod directory;
pub mod exporter;
pub mod formatter;
pub mod paginator;
pub mod parser;
pub mod selector;
pub mod session;
pub mod transport;

pub use assembler::assemble;
pub use directory::ChannelDirectory;
pub use exporter::{export_to_file, safe_file_name};
pub use formatter::{
    format_direct_table, format_guild_channels_table, format_guilds_table,
    format_messages_csv, format_messages_json, format_messages_text, render_messages_terminal,
    ExportFormat,
};
pub use paginator::Paginator;
pub use selector::{resolve_choice, Choice, Selector};
pub use transport::{Endpoint, FatalCause, Outcome, RateLimitedTransport, Transport};
