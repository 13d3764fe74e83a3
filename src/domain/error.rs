//! Domain-level error types for discord-chat-fetcher.
//!
//! All errors are typed with `thiserror`. Only [`AppError::Auth`] ends a
//! session; every other variant is local to one channel, guild or message.

use std::time::Duration;

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or expired credential.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// The session may not read this resource.
    #[error("Permission denied for {resource}")]
    Permission { resource: String },

    /// The resource no longer exists.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Server kept asking for backoff until the retry budget ran out.
    #[error("Rate limited on {resource} (last retry-after {retry_after:?})")]
    RateLimit {
        resource: String,
        retry_after: Duration,
    },

    /// Network or body decoding failure that survived every retry.
    #[error("Transient failure on {resource}: {message}")]
    Transient { resource: String, message: String },

    /// Unexpected status that is not worth retrying.
    #[error("API error on {resource}: status {status}: {message}")]
    Api {
        resource: String,
        status: u16,
        message: String,
    },

    /// A single record is malformed.
    #[error("Invalid data: {message}")]
    Data { message: String },

    /// Caller passed an argument outside the operation's contract.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Whether this error must abort the whole session rather than a single
    /// unit of work.
    #[must_use]
    pub const fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auth_is_session_fatal() {
        let auth = AppError::Auth {
            message: "401".into(),
        };
        let forbidden = AppError::Permission {
            resource: "channels/1/messages".into(),
        };
        let limited = AppError::RateLimit {
            resource: "guilds/2/channels".into(),
            retry_after: Duration::from_secs(1),
        };

        assert!(auth.is_session_fatal());
        assert!(!forbidden.is_session_fatal());
        assert!(!limited.is_session_fatal());
    }

    #[test]
    fn test_messages_name_the_resource() {
        let err = AppError::Api {
            resource: "channels/9/messages".into(),
            status: 400,
            message: "bad request".into(),
        };
        let text = err.to_string();
        assert!(text.contains("channels/9/messages"));
        assert!(text.contains("400"));
    }
}
