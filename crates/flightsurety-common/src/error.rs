//! Error types for the FlightSurety core
//!
//! Every command either succeeds or fails with exactly one of these kinds.
//! Failures abort the attempted transition with no partial state change.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{account::AccountId, flight::FlightKey};

/// Result type alias using SuretyError
pub type Result<T> = std::result::Result<T, SuretyError>;

/// Unified error type for FlightSurety operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuretyError {
    // Guard / authorization
    #[error("Operations are currently disabled")]
    OperationalDisabled,

    #[error("{caller} is not authorized for this operation")]
    Unauthorized { caller: AccountId },

    // Lookup errors
    #[error("Airline not found: {0}")]
    AirlineNotFound(AccountId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Flight not found: {0}")]
    FlightNotFound(FlightKey),

    #[error("No open status request for {flight} at index {index}")]
    RequestNotFound { flight: FlightKey, index: u8 },

    // Duplicate / idempotency errors
    #[error("Flight already registered: {0}")]
    DuplicateFlight(FlightKey),

    #[error("{voter} already approved {nominee}")]
    DuplicateVote { voter: AccountId, nominee: AccountId },

    #[error("Already registered: {0}")]
    AlreadyRegistered(AccountId),

    #[error("Airline already funded: {0}")]
    AlreadyFunded(AccountId),

    #[error("Status request for {flight} at index {index} is already resolved")]
    AlreadyResolved { flight: FlightKey, index: u8 },

    #[error("{passenger} already insured on {flight}")]
    AlreadyInsured { passenger: AccountId, flight: FlightKey },

    #[error("Flight status already settled: {0}")]
    FlightSettled(FlightKey),

    // Amount errors
    #[error("Insufficient funds: provided {provided}, required {required}")]
    InsufficientFunds { provided: Decimal, required: Decimal },

    #[error("Invalid amount {amount}: must be positive and at most {cap}")]
    InvalidAmount { amount: Decimal, cap: Decimal },

    #[error("Nothing to withdraw for {0}")]
    NothingToWithdraw(AccountId),

    #[error("Amount overflow in {0}")]
    AmountOverflow(&'static str),

    // Oracle input
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u8),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SuretyError {
    /// Late oracle deliveries are expected under asynchronous transport and
    /// carry no information for the caller.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, SuretyError::AlreadyResolved { .. })
    }
}
