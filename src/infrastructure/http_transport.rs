//! HTTPS transport for the Discord REST API.
//!
//! Performs one request per call and classifies the response; pacing and
//! retries live in `RateLimitedTransport`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::application::{Endpoint, FatalCause, Outcome, Transport};
use crate::domain::{ApiConfig, AppError, Result};

use super::session::Session;

/// Longest error body kept in a fatal outcome.
const MAX_ERROR_BODY: usize = 500;

/// reqwest-backed transport bound to one session.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds a client with the session's identity headers as defaults.
    ///
    /// # Errors
    /// Returns error if the headers are invalid or the client cannot be built.
    pub fn new(session: &Session, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(session.headers()?)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| AppError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Endpoint) -> Outcome {
        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(%url, query = ?endpoint.query(), "GET");

        let response = match self.client.get(&url).query(&endpoint.query()).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Outcome::FatalFailure(FatalCause::Request(e.to_string()))
            }
            Err(e) => return Outcome::TransientFailure(e.to_string()),
        };

        classify(response).await
    }
}

/// Maps an HTTP response onto an [`Outcome`].
async fn classify(response: Response) -> Outcome {
    let status = response.status();

    match status {
        s if s.is_success() => match response.json::<Value>().await {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => Outcome::TransientFailure(format!("malformed body: {e}")),
        },
        StatusCode::UNAUTHORIZED => Outcome::FatalFailure(FatalCause::Unauthorized),
        StatusCode::FORBIDDEN => Outcome::Forbidden,
        StatusCode::NOT_FOUND => Outcome::NotFound,
        StatusCode::TOO_MANY_REQUESTS => {
            Outcome::RateLimited(parse_retry_after(response.headers()))
        }
        s if s.is_server_error() => Outcome::TransientFailure(format!("server error {s}")),
        s => {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
                body.push_str("... (truncated)");
            }
            Outcome::FatalFailure(FatalCause::Status {
                status: s.as_u16(),
                body,
            })
        }
    }
}

/// Reads the `retry-after` header as fractional seconds.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
