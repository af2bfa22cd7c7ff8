//! Slack API client and message rendering

pub mod client;
pub mod message_formatter;

pub use client::SlackClient;
