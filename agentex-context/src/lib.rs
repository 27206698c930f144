//! Conversation context and context-window management.

pub mod context;
pub mod window;

pub use context::AgenticContext;
pub use window::{
    CompactionStrategy, FnTokenCounter, NoCompaction, SlidingWindow, Summarization, Summarizer,
    TokenCounter,
};
