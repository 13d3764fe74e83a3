//! Result assembly.
//!
//! Turns the paginator's raw batches into a [`FetchResult`]: parsed,
//! deduplicated by id, bounded by the requested count and ordered oldest
//! first.

use std::collections::HashSet;

use crate::domain::{FetchResult, Message};

use super::parser::{parse_message, MessageBatch};

/// Assembles batches (in arrival order, newest first) into a result.
///
/// A record that fails to parse is dropped and counted; it never aborts the
/// assembly. When more than `target_count` unique messages arrived, the
/// newest ones are kept.
#[must_use]
pub fn assemble(
    channel_id: &str,
    batches: Vec<MessageBatch>,
    target_count: usize,
) -> FetchResult {
    let mut seen = HashSet::new();
    let mut dropped: usize = batches.iter().map(|b| b.rejected).sum();
    let mut messages: Vec<Message> = Vec::new();

    for raw in batches.into_iter().flat_map(|b| b.messages) {
        if messages.len() >= target_count {
            break;
        }
        if seen.contains(&raw.id) {
            tracing::debug!(message_id = %raw.id, "Skipping duplicate message");
            continue;
        }

        match parse_message(raw) {
            Ok(message) => {
                seen.insert(message.id.clone());
                messages.push(message);
            }
            Err(e) => {
                dropped += 1;
                tracing::warn!(channel_id, "Dropping message: {e}");
            }
        }
    }

    // Stable: messages sharing a timestamp keep their relative order.
    messages.sort_by_key(|m| m.timestamp);

    FetchResult::new(channel_id.to_string(), target_count, messages, dropped)
}
