//! Flight registry
//!
//! Flights are never deleted. Their status is only ever written by oracle
//! consensus through [`FlightRegistry::apply_status`].

use std::collections::BTreeMap;

use flightsurety_common::{
    AccountId, EventJournal, FlightKey, FlightStatus, Result, SuretyError, SuretyEvent,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::registry::airlines::AirlineRegistry;

/// Registered flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub registered: bool,
    pub status: FlightStatus,
    /// Last status update (Unix seconds), registration time until consensus
    pub updated_at: i64,
    /// Set once consensus has applied a status
    pub settled: bool,
}

/// Read-only flight view for external collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub airline: AccountId,
    pub flight: String,
    pub departure: i64,
    pub flight_key: String,
    pub status: FlightStatus,
    pub status_code: u8,
    pub updated_at: i64,
    pub settled: bool,
}

impl From<&Flight> for FlightSummary {
    fn from(flight: &Flight) -> Self {
        Self {
            airline: flight.key.airline.clone(),
            flight: flight.key.code.clone(),
            departure: flight.key.departure,
            flight_key: flight.key.digest_hex(),
            status: flight.status,
            status_code: flight.status.code(),
            updated_at: flight.updated_at,
            settled: flight.settled,
        }
    }
}

/// Registered flights keyed by composite identity
#[derive(Debug, Default)]
pub struct FlightRegistry {
    flights: BTreeMap<FlightKey, Flight>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flight for a participating airline
    #[instrument(skip(self, airlines, journal))]
    pub fn register_flight(
        &mut self,
        airlines: &AirlineRegistry,
        airline: &AccountId,
        code: &str,
        departure: i64,
        journal: &mut EventJournal,
    ) -> Result<FlightKey> {
        airlines.ensure_participating(airline)?;

        let key = FlightKey::new(airline.clone(), code, departure);
        if self.flights.contains_key(&key) {
            return Err(SuretyError::DuplicateFlight(key));
        }

        self.flights.insert(
            key.clone(),
            Flight {
                key: key.clone(),
                registered: true,
                status: FlightStatus::Unknown,
                updated_at: chrono::Utc::now().timestamp(),
                settled: false,
            },
        );
        journal.record(SuretyEvent::FlightRegistered {
            flight_key: key.clone(),
        });
        info!(flight = %key, "Flight registered");

        Ok(key)
    }

    pub fn get_flight(&self, key: &FlightKey) -> Result<&Flight> {
        self.flights
            .get(key)
            .ok_or_else(|| SuretyError::FlightNotFound(key.clone()))
    }

    pub fn contains(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    pub fn is_settled(&self, key: &FlightKey) -> bool {
        self.flights.get(key).is_some_and(|f| f.settled)
    }

    pub fn summaries(&self) -> Vec<FlightSummary> {
        self.flights.values().map(FlightSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Overwrite a flight's status with a consensus result
    ///
    /// Last write wins; unknown keys are ignored since consensus only runs
    /// for registered flights.
    pub(crate) fn apply_status(
        &mut self,
        key: &FlightKey,
        status: FlightStatus,
        as_of: i64,
        journal: &mut EventJournal,
    ) {
        let Some(flight) = self.flights.get_mut(key) else {
            return;
        };

        flight.status = status;
        flight.updated_at = as_of;
        flight.settled = true;
        journal.record(SuretyEvent::FlightStatusUpdated {
            flight_key: key.clone(),
            status,
            updated_at: as_of,
        });
        info!(flight = %key, status = %status, "Flight status updated");
    }
}
