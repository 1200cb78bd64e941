//! Shared type definitions
//!
//! Task records, their lifecycle states and the reasoning-service payloads.

mod task;

pub use task::*;
