//! Domain layer - core types, configuration schema and errors.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (network, IO, etc.).

pub mod config;
pub mod error;
pub mod models;

pub use config::{ApiConfig, AppConfig, CredentialStorage, FetchConfig, PacingConfig, StorageConfig};
pub use error::{AppError, Result};
pub use models::{
    Attachment, Author, Channel, ChannelKind, CurrentUser, Directory, FetchResult, Guild,
    GuildRef, Message, NO_TEXT_PLACEHOLDER,
};
