//! Consensus module - oracle index assignment and flight-status quorum
//!
//! This module provides:
//! - Oracle roster with a fixed arena of per-index buckets
//! - Per-request response tallies with oracle deduplication
//! - The coordinator that opens requests and finalizes flight status

pub mod coordinator;
pub mod oracle;
pub mod quorum;

pub use coordinator::{OracleCoordinator, ResponseOutcome};
pub use oracle::{OracleAgent, OracleRoster};
pub use quorum::{RequestState, RequestSummary, StatusRequest, Vote};
