//! Backward pagination through a channel's history.

use crate::domain::{AppError, FetchResult, Result};

use super::assembler::assemble;
use super::parser::MessageBatch;
use super::transport::{Endpoint, RateLimitedTransport, Transport, MAX_BATCH_SIZE};

/// Drives cursor-based pagination over one channel.
///
/// Requests are strictly sequential: the next cursor is only known once the
/// previous batch has arrived.
pub struct Paginator<'a, T> {
    transport: &'a RateLimitedTransport<T>,
}

impl<'a, T: Transport> Paginator<'a, T> {
    pub const fn new(transport: &'a RateLimitedTransport<T>) -> Self {
        Self { transport }
    }

    /// Fetches up to `target_count` of the newest messages in `channel_id`.
    ///
    /// A short history, a permission boundary or an exhausted retry budget
    /// ends pagination early with whatever has been accumulated.
    ///
    /// # Errors
    /// `InvalidArgument` if `target_count` is not positive (checked before any
    /// call); `Auth` if the credential is rejected mid-way.
    pub async fn fetch(&self, channel_id: &str, target_count: i64) -> Result<FetchResult> {
        let target = usize::try_from(target_count)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| AppError::InvalidArgument {
                message: format!("message count must be positive, got {target_count}"),
            })?;

        let batch_delay = self.transport.pacing().batch_delay();
        let mut batches: Vec<MessageBatch> = Vec::new();
        let mut accumulated = 0;
        let mut before: Option<String> = None;

        while accumulated < target {
            let endpoint = Endpoint::Messages {
                channel_id: channel_id.to_string(),
                limit: MAX_BATCH_SIZE.min(target - accumulated),
                before: before.clone(),
            };

            let batch = match self.fetch_batch(&endpoint).await? {
                Some(batch) if !batch.is_empty() => batch,
                _ => {
                    tracing::info!(channel_id, accumulated, "Stopped fetching messages early");
                    break;
                }
            };

            accumulated += batch.len();
            let next = batch.oldest_id().map(str::to_string);
            batches.push(batch);

            tracing::info!(channel_id, accumulated, target, "Fetched batch");

            let Some(next) = next else {
                tracing::warn!(channel_id, "Page had no usable message id, stopping");
                break;
            };
            if before.as_deref() == Some(next.as_str()) {
                tracing::warn!(channel_id, cursor = %next, "Cursor did not advance, stopping");
                break;
            }
            before = Some(next);

            if accumulated < target {
                tokio::time::sleep(batch_delay).await;
            }
        }

        Ok(assemble(channel_id, batches, target))
    }

    /// One page. Failures local to this channel become `None`.
    async fn fetch_batch(&self, endpoint: &Endpoint) -> Result<Option<MessageBatch>> {
        let payload = match self.transport.call(endpoint).await {
            Ok(payload) => payload,
            Err(e) if e.is_session_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(resource = %endpoint, "Skipping channel: {e}");
                return Ok(None);
            }
        };

        match MessageBatch::from_payload(payload) {
            Ok(batch) => Ok(Some(batch)),
            Err(e) => {
                tracing::warn!(resource = %endpoint, "Malformed message page: {e}");
                Ok(None)
            }
        }
    }
}
