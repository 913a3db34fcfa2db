//! Validation engine module.
//!
//! Provides phase aggregation, run orchestration, notifications and the
//! in-memory result store.

pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod result;
pub mod store;
