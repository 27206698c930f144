//! Message, content and history-item shapes.
//!
//! These are reimplemented as tagged enums rather than a class hierarchy:
//! the operations performed over them are few (serialize, identify by
//! type, occasionally extract text) and exhaustive matching is cheaper
//! than a visitor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message's role. `Developer` occurs at most once and always at the
/// head of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    User,
    Assistant,
}

/// One piece of a message's content.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageByUrl { url: String },
    ImageById { id: String },
    FileByUrl { url: String },
    FileById { id: String },
    FileByBase64 { data: String, mime_type: String },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// Returns the text payload, if this item carries one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// An immutable conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentItem>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentItem>) -> Self {
        Self { role, content }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentItem::text(text)])
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentItem::text(text)])
    }

    pub fn developer_text(text: impl Into<String>) -> Self {
        Self::new(Role::Developer, vec![ContentItem::text(text)])
    }

    /// Concatenates every text content item, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentItem::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A function-tool-call record, as extracted from a model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallItem {
    pub name: String,
    pub call_id: String,
    pub raw_arguments: Value,
}

/// The outcome of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutputResult {
    Success { text: String },
    Error { text: String },
}

impl ToolOutputResult {
    pub fn text(&self) -> &str {
        match self {
            ToolOutputResult::Success { text } => text,
            ToolOutputResult::Error { text } => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutputResult::Error { .. })
    }
}

/// A tool's output, keyed back to the call it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutputItem {
    pub call_id: String,
    pub result: ToolOutputResult,
}

/// One entry in conversation history: a message, a tool call emitted by
/// the model, or a tool's output fed back to the model.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryItem {
    Message(Message),
    ToolCall(ToolCallItem),
    ToolOutput(ToolOutputItem),
}

impl HistoryItem {
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            HistoryItem::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCallItem> {
        match self {
            HistoryItem::ToolCall(c) => Some(c),
            _ => None,
        }
    }
}
