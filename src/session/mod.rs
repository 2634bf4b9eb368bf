//! Streaming session bookkeeping
//!
//! This module provides the per-connection `SessionState` and the process-wide
//! `SessionRegistry`:
//! - Finalized transcript segments and partial-emission bookkeeping
//! - Lifecycle (`Listening` → `Finalizing` → `Closed`) guarded by a single-entry latch
//! - Registry of live sessions, touched only on create and remove

mod config;
mod registry;
mod state;
mod stats;

pub use config::SessionConfig;
pub use registry::SessionRegistry;
pub use state::{count_words, FinalizeLatch, FinalizeTrigger, LifecycleState, SessionState};
pub use stats::{ActiveSession, SessionSummary};
