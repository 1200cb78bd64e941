//! Reasoning service clients
//!
//! The orchestrator talks to the external reasoning service through three
//! contracts (analyze, generate, execute). This module defines them and
//! provides the HTTP implementation.

mod http;
#[cfg(test)]
mod mock;
mod traits;

pub use http::HttpReasoningClient;
#[cfg(test)]
pub use mock::{MockConfig, MockReasoningService, MockReply};
pub use traits::*;
