//! Worker Lambda handler and run orchestration

pub mod deliver;
pub mod handler;
pub mod orchestrate;

// Re-export the main handler for convenience
pub use handler::handler;
