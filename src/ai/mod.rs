//! LLM summarization capability

pub mod client;

pub use client::{OpenAiSummarizer, Summarize};
