//! Bounds the token footprint of request history before every model call.
//!
//! Both strategies below consume a caller-supplied [`TokenCounter`]; this
//! crate does not implement tokenization itself, and deliberately avoids
//! baking in a fixed chars-per-token heuristic. The manager always
//! operates on a copy of history and never mutates the stored context —
//! callers get the trimmed copy back from [`CompactionStrategy::compact`]
//! and use it only for the current request.

use agentex_core::{AgentError, HistoryItem, Message, Role};
use async_trait::async_trait;
use std::sync::Arc;

/// A pure function from a slice of history items to an estimated token
/// count. Implementations are supplied by the caller — this crate never
/// guesses at tokenization.
pub trait TokenCounter: Send + Sync {
    fn count(&self, items: &[HistoryItem]) -> u64;
}

/// A `TokenCounter` built from a plain closure, for callers who don't
/// want to name a type.
pub struct FnTokenCounter<F>(pub F)
where
    F: Fn(&[HistoryItem]) -> u64 + Send + Sync;

impl<F> TokenCounter for FnTokenCounter<F>
where
    F: Fn(&[HistoryItem]) -> u64 + Send + Sync,
{
    fn count(&self, items: &[HistoryItem]) -> u64 {
        (self.0)(items)
    }
}

/// A history-trimming or -summarizing strategy, applied before assembling
/// each turn's request payload.
#[async_trait]
pub trait CompactionStrategy: Send + Sync {
    fn should_compact(&self, items: &[HistoryItem], counter: &dyn TokenCounter) -> bool;

    async fn compact(
        &self,
        items: Vec<HistoryItem>,
        counter: &dyn TokenCounter,
    ) -> Result<Vec<HistoryItem>, AgentError>;
}

fn is_developer_message(item: &HistoryItem) -> bool {
    matches!(item.as_message(), Some(m) if m.role == Role::Developer)
}

/// Drops oldest items until the remaining set fits `max_tokens`.
///
/// When `preserve_developer_message` is set, a developer message at the
/// head of history is never dropped and stays pinned to the head of the
/// result.
pub struct SlidingWindow {
    pub max_tokens: u64,
    pub preserve_developer_message: bool,
}

impl SlidingWindow {
    pub fn new(max_tokens: u64) -> Self {
        Self {
            max_tokens,
            preserve_developer_message: true,
        }
    }
}

#[async_trait]
impl CompactionStrategy for SlidingWindow {
    fn should_compact(&self, items: &[HistoryItem], counter: &dyn TokenCounter) -> bool {
        counter.count(items) > self.max_tokens
    }

    async fn compact(
        &self,
        items: Vec<HistoryItem>,
        counter: &dyn TokenCounter,
    ) -> Result<Vec<HistoryItem>, AgentError> {
        let (head, mut rest) = if self.preserve_developer_message
            && items.first().is_some_and(is_developer_message)
        {
            let mut items = items;
            let head = items.remove(0);
            (Some(head), items)
        } else {
            (None, items)
        };

        let before = counter.count(&head.iter().cloned().chain(rest.iter().cloned()).collect::<Vec<_>>());
        loop {
            let combined: Vec<HistoryItem> = head
                .iter()
                .cloned()
                .chain(rest.iter().cloned())
                .collect();
            if counter.count(&combined) <= self.max_tokens || rest.is_empty() {
                let after = counter.count(&combined);
                if after < before {
                    tracing::info!(
                        old_tokens = before,
                        new_tokens = after,
                        reduced_by = before - after,
                        "agentex.context.compaction"
                    );
                }
                return Ok(combined);
            }
            rest.remove(0);
        }
    }
}

/// Produces a summary message for the prefix of history being dropped.
/// Implemented by a separate, caller-supplied model call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, items: &[HistoryItem], prompt: &str) -> Result<Message, AgentError>;
}

/// Keeps the most recent `keep_recent_messages` items verbatim; replaces
/// the older prefix with a single summary assistant message.
pub struct Summarization {
    pub max_tokens: u64,
    pub keep_recent_messages: usize,
    pub summarizer: Arc<dyn Summarizer>,
    pub prompt: String,
}

#[async_trait]
impl CompactionStrategy for Summarization {
    fn should_compact(&self, items: &[HistoryItem], counter: &dyn TokenCounter) -> bool {
        counter.count(items) > self.max_tokens
    }

    async fn compact(
        &self,
        items: Vec<HistoryItem>,
        _counter: &dyn TokenCounter,
    ) -> Result<Vec<HistoryItem>, AgentError> {
        if items.len() <= self.keep_recent_messages {
            return Ok(items);
        }
        let split_at = items.len() - self.keep_recent_messages;
        let (prefix, recent) = items.split_at(split_at);
        tracing::info!(
            summarized_items = prefix.len(),
            kept_recent = recent.len(),
            "agentex.context.compaction"
        );
        let summary = self.summarizer.summarize(prefix, &self.prompt).await?;
        let mut result = vec![HistoryItem::Message(summary)];
        result.extend(recent.iter().cloned());
        Ok(result)
    }
}

/// No-op strategy: never compacts. Used when `contextManagementConfig` is
/// absent — the loop simply sends the original history unmodified.
pub struct NoCompaction;

#[async_trait]
impl CompactionStrategy for NoCompaction {
    fn should_compact(&self, _items: &[HistoryItem], _counter: &dyn TokenCounter) -> bool {
        false
    }

    async fn compact(
        &self,
        items: Vec<HistoryItem>,
        _counter: &dyn TokenCounter,
    ) -> Result<Vec<HistoryItem>, AgentError> {
        Ok(items)
    }
}
