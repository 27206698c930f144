//! `AgenticContext`: the mutable, per-conversation state owned by exactly
//! one `interact` call at a time.

use agentex_core::{ContentItem, HistoryItem, Message, RequestId, Role, SpanId, ToolOutputItem, TraceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered history, a user-addressable state map, and trace correlation
/// for one conversation.
///
/// Invariants upheld by this type: `history` never shrinks except via an
/// explicit copy handed to a window-manager strategy (the manager never
/// mutates `self.history`); `turn_count` strictly increases within a
/// single `interact` call, via [`AgenticContext::increment_turn`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgenticContext {
    history: Vec<HistoryItem>,
    state: HashMap<String, serde_json::Value>,
    turn_count: u32,
    pub parent_trace_id: Option<TraceId>,
    pub parent_span_id: Option<SpanId>,
    pub request_id: Option<RequestId>,
}

impl AgenticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_text(text: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.add_message(Message::user_text(text));
        ctx
    }

    pub fn add_message(&mut self, msg: Message) {
        self.history.push(HistoryItem::Message(msg));
    }

    pub fn add_input(&mut self, item: HistoryItem) {
        self.history.push(item);
    }

    pub fn add_tool_result(&mut self, output: ToolOutputItem) {
        self.history.push(HistoryItem::ToolOutput(output));
    }

    /// An unmodifiable view of history.
    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    /// A fresh, independently-owned copy of history, used by the window
    /// manager and payload assembly — mutating it never affects `self`.
    pub fn history_mutable(&self) -> Vec<HistoryItem> {
        self.history.clone()
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Pre-increments and returns the new turn count. Intended to be
    /// called by the engine loop only, once per turn.
    pub fn increment_turn(&mut self) -> u32 {
        self.turn_count += 1;
        self.turn_count
    }

    /// Ensures trace IDs are populated, generating fresh ones if absent.
    /// Returns the (possibly newly generated) pair.
    pub fn ensure_trace_ids(&mut self) -> (TraceId, SpanId) {
        let trace_id = self.parent_trace_id.get_or_insert_with(TraceId::new).clone();
        let span_id = self.parent_span_id.get_or_insert_with(SpanId::new).clone();
        (trace_id, span_id)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    pub fn state(&self) -> &HashMap<String, serde_json::Value> {
        &self.state
    }

    /// Deep-copies history and state; preserves turn counter and trace
    /// IDs. Used for parallel fan-out, which explicitly copies contexts
    /// rather than sharing one.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// `copy()` plus: overwrite parent span with a new one and reset the
    /// turn counter. Used when a parent agent hands off or delegates to
    /// a child agent.
    pub fn fork(&self, new_parent_span_id: SpanId) -> Self {
        let mut forked = self.copy();
        forked.parent_span_id = Some(new_parent_span_id);
        forked.turn_count = 0;
        forked
    }

    /// Concatenated text of every user-role message, used for input
    /// guardrail checks.
    pub fn user_text(&self) -> String {
        self.history
            .iter()
            .filter_map(HistoryItem::as_message)
            .filter(|m| m.role == Role::User)
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Appends a plain user text message — the common case for the
    /// convenience entry points on [`crate::Agent`] (text/image/file
    /// inputs are all folded into a single message append).
    pub fn append_user_content(&mut self, items: Vec<ContentItem>) {
        self.add_message(Message::new(Role::User, items));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_turn_strictly_increases() {
        let mut ctx = AgenticContext::new();
        assert_eq!(ctx.increment_turn(), 1);
        assert_eq!(ctx.increment_turn(), 2);
        assert_eq!(ctx.turn_count(), 2);
    }

    #[test]
    fn ensure_trace_ids_generates_once_then_is_stable() {
        let mut ctx = AgenticContext::new();
        assert!(ctx.parent_trace_id.is_none());
        let (t1, s1) = ctx.ensure_trace_ids();
        let (t2, s2) = ctx.ensure_trace_ids();
        assert_eq!(t1, t2);
        assert_eq!(s1, s2);
    }

    #[test]
    fn copy_is_independent_of_original() {
        let mut ctx = AgenticContext::with_user_text("hi");
        let copy = ctx.copy();
        ctx.add_message(Message::assistant_text("there"));
        assert_eq!(copy.history().len(), 1);
        assert_eq!(ctx.history().len(), 2);
    }

    #[test]
    fn fork_resets_turn_and_replaces_parent_span() {
        let mut ctx = AgenticContext::with_user_text("hi");
        ctx.increment_turn();
        ctx.increment_turn();
        let new_span = SpanId::new();
        let forked = ctx.fork(new_span.clone());
        assert_eq!(forked.turn_count(), 0);
        assert_eq!(forked.parent_span_id, Some(new_span));
        assert_eq!(forked.history().len(), 1);
    }

    #[test]
    fn history_mutable_copy_does_not_alias_stored_history() {
        let mut ctx = AgenticContext::with_user_text("hi");
        let mut copy = ctx.history_mutable();
        copy.push(HistoryItem::Message(Message::assistant_text("extra")));
        assert_eq!(ctx.history().len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
