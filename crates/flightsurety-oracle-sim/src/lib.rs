//! # FlightSurety Oracle Simulator
//!
//! Drives a [`flightsurety_core::FlightSurety`] engine the way a fleet of
//! off-chain oracle servers would: oracles register once, then answer every
//! status request for their indexes concurrently and out of order.

pub mod config;
pub mod swarm;

pub use config::SimConfig;
pub use swarm::{DeliveryReport, OracleSwarm, SwarmSettings};

use std::time::Duration;

impl SimConfig {
    /// Swarm behaviour derived from the simulation settings
    pub fn swarm_settings(&self) -> SwarmSettings {
        SwarmSettings {
            reported_status: self.reported_status,
            max_delay: Duration::from_millis(self.max_delay_ms),
            redeliveries: self.redeliveries,
        }
    }
}
