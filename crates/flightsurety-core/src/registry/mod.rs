//! Airline and flight registries
//!
//! - [`airlines`]: airline lifecycle and multi-party admission voting
//! - [`flights`]: registered flights and their consensus status

pub mod airlines;
pub mod flights;

pub use airlines::{Admission, AdmissionState, Airline, AirlineRegistry, AirlineSummary};
pub use flights::{Flight, FlightRegistry, FlightSummary};
