//! Rate-limited transport.
//!
//! [`Transport`] performs exactly one outbound call and classifies the reply
//! into an [`Outcome`]. [`RateLimitedTransport`] layers the pacing policy on
//! top: it honours server backoff, retries transient failures within a fixed
//! budget and maps everything else onto [`AppError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{AppError, PacingConfig, Result};

/// Remote API cap on messages per call.
pub const MAX_BATCH_SIZE: usize = 100;

/// A logical request against the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /users/@me`
    CurrentUser,
    /// `GET /users/@me/guilds`
    Guilds,
    /// `GET /users/@me/channels`
    DirectChannels,
    /// `GET /guilds/{id}/channels`
    GuildChannels { guild_id: String },
    /// `GET /channels/{id}/messages?limit&before`
    Messages {
        channel_id: String,
        limit: usize,
        before: Option<String>,
    },
}

impl Endpoint {
    /// Path relative to the API base.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::CurrentUser => "/users/@me".into(),
            Self::Guilds => "/users/@me/guilds".into(),
            Self::DirectChannels => "/users/@me/channels".into(),
            Self::GuildChannels { guild_id } => format!("/guilds/{guild_id}/channels"),
            Self::Messages { channel_id, .. } => format!("/channels/{channel_id}/messages"),
        }
    }

    /// Query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Messages { limit, before, .. } => {
                let mut query = vec![("limit", (*limit).min(MAX_BATCH_SIZE).to_string())];
                if let Some(before) = before {
                    query.push(("before", before.clone()));
                }
                query
            }
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Why a call failed for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalCause {
    /// Credential rejected (401).
    Unauthorized,
    /// Any other status not covered by the retry policy.
    Status { status: u16, body: String },
    /// The request could not be built.
    Request(String),
}

/// Classified result of a single outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    /// Server-requested backoff; `None` when the header was absent.
    RateLimited(Option<Duration>),
    Forbidden,
    NotFound,
    /// Network error, timeout, 5xx or undecodable body.
    TransientFailure(String),
    FatalFailure(FatalCause),
}

/// One outbound call, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint) -> Outcome;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, endpoint: &Endpoint) -> Outcome {
        (**self).send(endpoint).await
    }
}

/// Transport wrapper applying backoff and the retry budget.
pub struct RateLimitedTransport<T> {
    inner: T,
    pacing: PacingConfig,
}

impl<T: Transport> RateLimitedTransport<T> {
    pub const fn new(inner: T, pacing: PacingConfig) -> Self {
        Self { inner, pacing }
    }

    #[must_use]
    pub const fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    /// Performs a logical request.
    ///
    /// A rate-limited attempt suspends for at least the server-supplied delay
    /// before the same request is retried. Transient failures pause for the
    /// fixed transient pause. Both share the attempt budget.
    ///
    /// # Errors
    /// `Auth` on 401, `Permission` on 403 (never retried), `NotFound`,
    /// `Api` for other statuses, `RateLimit`/`Transient` once the budget is spent.
    pub async fn call(&self, endpoint: &Endpoint) -> Result<Value> {
        let max_attempts = self.pacing.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.inner.send(endpoint).await {
                Outcome::Success(payload) => return Ok(payload),
                Outcome::Forbidden => {
                    return Err(AppError::Permission {
                        resource: endpoint.to_string(),
                    })
                }
                Outcome::NotFound => {
                    return Err(AppError::NotFound {
                        resource: endpoint.to_string(),
                    })
                }
                Outcome::FatalFailure(cause) => return Err(fatal_error(endpoint, cause)),
                Outcome::RateLimited(retry_after) => {
                    let wait = retry_after.unwrap_or_else(|| self.pacing.default_retry_after());
                    if attempt >= max_attempts {
                        tracing::warn!(
                            resource = %endpoint,
                            attempt,
                            retry_after = ?wait,
                            "Rate limit persisted after retries"
                        );
                        return Err(AppError::RateLimit {
                            resource: endpoint.to_string(),
                            retry_after: wait,
                        });
                    }
                    tracing::warn!(
                        resource = %endpoint,
                        attempt,
                        retry_after = ?wait,
                        "Rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                Outcome::TransientFailure(cause) => {
                    if attempt >= max_attempts {
                        tracing::warn!(
                            resource = %endpoint,
                            attempt,
                            %cause,
                            "Giving up after transient failures"
                        );
                        return Err(AppError::Transient {
                            resource: endpoint.to_string(),
                            message: cause,
                        });
                    }
                    tracing::debug!(
                        resource = %endpoint,
                        attempt,
                        %cause,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.pacing.transient_pause()).await;
                }
            }
        }
    }
}

fn fatal_error(endpoint: &Endpoint, cause: FatalCause) -> AppError {
    match cause {
        FatalCause::Unauthorized => AppError::Auth {
            message: format!("credential rejected on {endpoint} (401)"),
        },
        FatalCause::Status { status, body } => AppError::Api {
            resource: endpoint.to_string(),
            status,
            message: body,
        },
        FatalCause::Request(message) => AppError::Config { message },
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use serde_json::json;

    fn limited(transport: Arc<ScriptedTransport>) -> RateLimitedTransport<Arc<ScriptedTransport>> {
        RateLimitedTransport::new(transport, PacingConfig::default())
    }

    #[test]
    fn test_messages_endpoint_query() {
        let endpoint = Endpoint::Messages {
            channel_id: "123".into(),
            limit: 250,
            before: Some("99".into()),
        };
        assert_eq!(endpoint.path(), "/channels/123/messages");
        assert_eq!(
            endpoint.query(),
            vec![("limit", "100".to_string()), ("before", "99".to_string())]
        );
        assert!(Endpoint::Guilds.query().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_retry_after_before_retrying() {
        let transport = Arc::new(ScriptedTransport::new([
            Outcome::RateLimited(Some(Duration::from_secs(2))),
            Outcome::Success(json!({"ok": true})),
        ]));
        let limited = limited(Arc::clone(&transport));

        let start = tokio::time::Instant::now();
        let payload = limited.call(&Endpoint::CurrentUser).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(payload, json!({"ok": true}));
        assert_eq!(transport.calls(), vec![Endpoint::CurrentUser, Endpoint::CurrentUser]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_header_defaults_to_one_second() {
        let transport = Arc::new(ScriptedTransport::new([
            Outcome::RateLimited(None),
            Outcome::Success(json!([])),
        ]));
        let limited = limited(transport);

        let start = tokio::time::Instant::now();
        limited.call(&Endpoint::Guilds).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_budget() {
        let transport = Arc::new(ScriptedTransport::new([
            Outcome::TransientFailure("connection reset".into()),
            Outcome::TransientFailure("connection reset".into()),
            Outcome::TransientFailure("connection reset".into()),
            Outcome::Success(json!([])),
        ]));
        let limited = limited(Arc::clone(&transport));

        let start = tokio::time::Instant::now();
        let err = limited.call(&Endpoint::DirectChannels).await.unwrap_err();

        assert!(matches!(err, AppError::Transient { .. }));
        assert_eq!(transport.calls().len(), 3);
        // Two pauses between three attempts.
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_forbidden_is_never_retried() {
        let transport = Arc::new(ScriptedTransport::new([
            Outcome::Forbidden,
            Outcome::Success(json!([])),
        ]));
        let limited = limited(Arc::clone(&transport));

        let err = limited
            .call(&Endpoint::GuildChannels {
                guild_id: "7".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Permission { ref resource } if resource == "/guilds/7/channels"
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_is_session_fatal() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::FatalFailure(
            FatalCause::Unauthorized,
        )]));
        let err = limited(transport)
            .call(&Endpoint::CurrentUser)
            .await
            .unwrap_err();

        assert!(err.is_session_fatal());
    }

    #[tokio::test]
    async fn test_unexpected_status_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new([Outcome::FatalFailure(
            FatalCause::Status {
                status: 400,
                body: "bad".into(),
            },
        )]));
        let err = limited(Arc::clone(&transport))
            .call(&Endpoint::Guilds)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Api { status: 400, .. }));
        assert_eq!(transport.calls().len(), 1);
    }
}
