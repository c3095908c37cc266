//! # FlightSurety Core
//!
//! Decision and settlement logic for flight-delay insurance.
//!
//! ## Components
//!
//! - **OperationalGuard**: administrator-controlled kill switch
//! - **AirlineRegistry**: airline funding and multi-party admission voting
//! - **FlightRegistry**: registered flights and their consensus status
//! - **OracleCoordinator**: oracle index assignment and status quorum
//! - **InsuranceLedger**: policies, passenger balances and payouts
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         FlightSurety                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │   Airline    │──▶│    Flight    │◀──│      Oracle      │  │
//! │  │   Registry   │   │   Registry   │ 1 │   Coordinator    │  │
//! │  └──────────────┘   └──────────────┘   └────────┬─────────┘  │
//! │                            ▲                  2 │            │
//! │                            │           ┌────────▼─────────┐  │
//! │                            └───────────│ InsuranceLedger  │  │
//! │                                        └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On quorum the coordinator applies the status to the flight (1) before
//! settling policies (2).

pub mod consensus;
pub mod engine;
pub mod guard;
pub mod insurance;
pub mod registry;
pub mod shared;

pub use consensus::{OracleCoordinator, RequestState, RequestSummary, ResponseOutcome};
pub use engine::FlightSurety;
pub use guard::OperationalGuard;
pub use insurance::{Accounting, InsuranceLedger, InsurancePolicy, PolicyState};
pub use registry::{
    Admission, AdmissionState, Airline, AirlineRegistry, AirlineSummary, Flight, FlightRegistry,
    FlightSummary,
};
pub use shared::SharedSurety;
