//! # FlightSurety Common
//!
//! Shared types, errors, and parameters for the FlightSurety insurance core.
//!
//! ## Core Types
//!
//! - [`AccountId`]: opaque identity of an airline, passenger, oracle or administrator
//! - [`FlightKey`]: composite flight identity (airline, code, departure timestamp)
//! - [`FlightStatus`]: oracle-reported flight status with its wire code
//! - [`SuretyParams`]: tunable quorum, funding and payout constants
//!
//! ## Events
//!
//! - [`SuretyEvent`]: integration events consumed by transport/UI layers
//! - [`EventJournal`]: append-only, sequence-numbered event log for polling

pub mod error;
pub mod events;
pub mod params;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Result, SuretyError};
pub use events::{EventJournal, JournalEntry, SuretyEvent};
pub use params::SuretyParams;
pub use types::{
    account::AccountId,
    flight::{FlightKey, FlightStatus},
    Amount,
};

/// FlightSurety version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registered airlines admitted without a vote before multi-party approval applies
pub const BOOTSTRAP_AIRLINES: usize = 4;

/// Matching oracle responses required to finalize a status request
pub const QUORUM_THRESHOLD: usize = 3;

/// Size of the oracle index space (indexes are `0..INDEX_SPACE`)
pub const INDEX_SPACE: u8 = 10;

/// Distinct indexes assigned to each oracle at registration
pub const INDEXES_PER_ORACLE: usize = 3;
