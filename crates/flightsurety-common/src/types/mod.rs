//! Core data types for FlightSurety

pub mod account;
pub mod flight;

/// Monetary amount in the platform's base unit
pub type Amount = rust_decimal::Decimal;
