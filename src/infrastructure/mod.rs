//! Infrastructure layer - external adapters (HTTP, filesystem, environment).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod credentials;
pub mod http_transport;
pub mod session;

pub use config::{ensure_config_exists, load_config, render_config};
pub use credentials::{load_token, save_token, save_token_keyring, TOKEN_ENV};
pub use http_transport::HttpTransport;
pub use session::Session;
