//! Task executor module
//!
//! Handles the task execution lifecycle:
//! - Choosing a strategy via the reasoning service
//! - Running the dynamic generate/execute pipeline
//! - Completing default-path tasks in the background
//! - Keeping the canonical task records

mod pipeline;
mod runner;
mod state;
mod worker;

pub use pipeline::*;
pub use runner::*;
pub use state::*;
pub use worker::*;
