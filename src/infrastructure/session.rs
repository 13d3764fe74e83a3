//! Authenticated session.
//!
//! Holds the credential and the fixed identity headers attached to every
//! outbound call. Built once at startup, read-only afterwards.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT,
};

use crate::domain::{ApiConfig, AppError, Result};

/// Credential plus client identity.
#[derive(Clone)]
pub struct Session {
    token: String,
    locale: String,
    timezone: String,
    user_agent: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("locale", &self.locale)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session from a loaded secret.
    ///
    /// # Errors
    /// Returns error if the token is empty after trimming.
    pub fn new(token: &str, api: &ApiConfig) -> Result<Self> {
        let token = clean_token(token);
        if token.is_empty() {
            return Err(AppError::Auth {
                message: "empty token".into(),
            });
        }

        Ok(Self {
            token,
            locale: api.locale.clone(),
            timezone: api.timezone.clone(),
            user_agent: api.user_agent.clone(),
        })
    }

    /// Identity headers sent with every request.
    ///
    /// # Errors
    /// Returns error if a value contains characters not allowed in headers.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut auth = header_value(&self.token)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value(&format!("{},en;q=0.9", self.locale))?,
        );
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(
            HeaderName::from_static("x-discord-locale"),
            header_value(&self.locale)?,
        );
        headers.insert(
            HeaderName::from_static("x-discord-timezone"),
            header_value(&self.timezone)?,
        );

        Ok(headers)
    }
}

/// Strips whitespace and surrounding quotes, as pasted from `.env` files.
#[must_use]
pub fn clean_token(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| AppError::Config {
        message: format!("invalid header value: {e}"),
    })
}
