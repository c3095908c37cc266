//! Oracle coordination and status consensus
//!
//! Coordinates the status workflow:
//! 1. Registers oracles and draws their index sets
//! 2. Opens a status request on a random index for a flight
//! 3. Collects oracle responses into the (flight, index) bucket
//! 4. On the first quorum for a flight, applies the status to the flight
//!    registry and then settles policies in the insurance ledger, in that order

use std::collections::{BTreeMap, HashMap};

use flightsurety_common::{
    AccountId, Amount, EventJournal, FlightKey, FlightStatus, Result, SuretyError, SuretyEvent,
    SuretyParams,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use crate::consensus::oracle::{OracleAgent, OracleRoster};
use crate::consensus::quorum::{RequestSummary, StatusRequest, Vote};
use crate::insurance::ledger::{InsuranceLedger, Settlement};
use crate::registry::flights::FlightRegistry;

/// Effect of an accepted oracle submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Counted toward quorum, not yet reached
    Accepted {
        status: FlightStatus,
        matching: usize,
        required: usize,
    },
    /// The oracle had already answered this request; nothing counted
    Duplicate,
    /// This response completed the quorum.
    /// `finalized` is false when an earlier request already settled the flight.
    Resolved {
        status: FlightStatus,
        finalized: bool,
    },
}

/// Assigns oracle indexes and resolves flight status from their responses
#[derive(Debug)]
pub struct OracleCoordinator {
    quorum_threshold: usize,
    index_space: u8,
    indexes_per_oracle: usize,
    registration_fee: Amount,
    roster: OracleRoster,
    requests: HashMap<FlightKey, BTreeMap<u8, StatusRequest>>,
    finalized: HashMap<FlightKey, FlightStatus>,
    rng: StdRng,
}

impl OracleCoordinator {
    /// Create a coordinator drawing indexes from OS entropy
    pub fn new(params: &SuretyParams) -> Self {
        Self {
            quorum_threshold: params.quorum_threshold,
            index_space: params.index_space,
            indexes_per_oracle: params.indexes_per_oracle,
            registration_fee: params.oracle_registration_fee,
            roster: OracleRoster::new(params.index_space),
            requests: HashMap::new(),
            finalized: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Make index draws reproducible
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn quorum_threshold(&self) -> usize {
        self.quorum_threshold
    }

    pub fn roster(&self) -> &OracleRoster {
        &self.roster
    }

    /// Register an oracle and assign it a random set of distinct indexes
    #[instrument(skip(self, journal))]
    pub fn register_oracle(
        &mut self,
        oracle: &AccountId,
        fee: Amount,
        journal: &mut EventJournal,
    ) -> Result<Vec<u8>> {
        if self.roster.contains(oracle) {
            return Err(SuretyError::AlreadyRegistered(oracle.clone()));
        }
        if fee < self.registration_fee {
            return Err(SuretyError::InsufficientFunds {
                provided: fee,
                required: self.registration_fee,
            });
        }

        let mut indexes = self.draw_indexes();
        indexes.sort_unstable();

        self.roster.insert(OracleAgent {
            id: oracle.clone(),
            indexes: indexes.clone(),
            fee_paid: fee,
            registered_at: chrono::Utc::now().timestamp_millis(),
        })?;
        journal.record(SuretyEvent::OracleRegistered {
            oracle: oracle.clone(),
            indexes: indexes.clone(),
        });
        info!(oracle = %oracle, ?indexes, "Oracle registered");

        Ok(indexes)
    }

    /// Indexes assigned to an oracle
    pub fn oracle_indexes(&self, oracle: &AccountId) -> Result<&[u8]> {
        self.roster
            .get(oracle)
            .map(|agent| agent.indexes.as_slice())
            .ok_or_else(|| SuretyError::NotFound(format!("oracle {oracle}")))
    }

    /// Oracles expected to answer requests on `index`
    pub fn oracles_for_index(&self, index: u8) -> Vec<AccountId> {
        self.roster
            .bucket(index)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Open a status request on a random index and return that index
    ///
    /// An already open request on the drawn index is reused with its votes.
    /// A resolved one stays resolved and is not announced again, since no
    /// response to it can count.
    #[instrument(skip(self, journal))]
    pub fn request_status(&mut self, flight: &FlightKey, journal: &mut EventJournal) -> u8 {
        let index = self.rng.gen_range(0..self.index_space);

        let requests = self.requests.entry(flight.clone()).or_default();
        let request = requests
            .entry(index)
            .or_insert_with(|| StatusRequest::new(flight.clone(), index));
        if !request.is_open() {
            debug!(flight = %flight, index, "Request already resolved, not announced");
            return index;
        }
        debug!(request_id = %request.request_id, "Status request");

        journal.record(SuretyEvent::StatusRequested {
            flight_key: flight.clone(),
            index,
        });
        info!(flight = %flight, index, "Status requested");

        index
    }

    /// Record an oracle's response and resolve the request on quorum
    ///
    /// When the response would finalize the flight, settlement is planned
    /// first; if that fails the response is not counted and nothing changes.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, flights, ledger, journal))]
    pub fn submit_response(
        &mut self,
        oracle: &AccountId,
        index: u8,
        flight: &FlightKey,
        status_code: u8,
        flights: &mut FlightRegistry,
        ledger: &mut InsuranceLedger,
        journal: &mut EventJournal,
    ) -> Result<ResponseOutcome> {
        let authorized = self
            .roster
            .get(oracle)
            .is_some_and(|agent| agent.holds(index));
        if !authorized {
            return Err(SuretyError::Unauthorized {
                caller: oracle.clone(),
            });
        }
        let status = FlightStatus::from_code(status_code)?;

        let request = self
            .requests
            .get_mut(flight)
            .and_then(|requests| requests.get_mut(&index))
            .ok_or_else(|| SuretyError::RequestNotFound {
                flight: flight.clone(),
                index,
            })?;

        let settlement = match request.preview(oracle, status, self.quorum_threshold) {
            Vote::Reached(status) if !self.finalized.contains_key(flight) => {
                Some(ledger.plan_settlement(flight, status)?)
            }
            _ => None,
        };

        let vote = request.record(oracle, status, self.quorum_threshold);
        let outcome = match vote {
            Vote::Closed => {
                return Err(SuretyError::AlreadyResolved {
                    flight: flight.clone(),
                    index,
                })
            }
            Vote::Duplicate => {
                debug!(oracle = %oracle, flight = %flight, index, "Duplicate response ignored");
                return Ok(ResponseOutcome::Duplicate);
            }
            Vote::Counted {
                status,
                matching,
                required,
            } => ResponseOutcome::Accepted {
                status,
                matching,
                required,
            },
            Vote::Reached(status) => ResponseOutcome::Resolved {
                status,
                finalized: settlement.is_some(),
            },
        };

        journal.record(SuretyEvent::OracleReport {
            flight_key: flight.clone(),
            index,
            oracle: oracle.clone(),
            status,
        });

        if let ResponseOutcome::Resolved { status, .. } = outcome {
            match settlement {
                Some(settlement) => {
                    self.finalize(flight, status, settlement, flights, ledger, journal);
                }
                None => {
                    debug!(flight = %flight, index, "Flight already settled by an earlier request");
                }
            }
        }

        Ok(outcome)
    }

    /// Progress of every request opened for a flight, by index
    pub fn responses(&self, flight: &FlightKey) -> Vec<RequestSummary> {
        self.requests
            .get(flight)
            .map(|requests| requests.values().map(StatusRequest::summary).collect())
            .unwrap_or_default()
    }

    /// Status finalized for a flight by its first quorum, if any
    pub fn finalized_status(&self, flight: &FlightKey) -> Option<FlightStatus> {
        self.finalized.get(flight).copied()
    }

    fn finalize(
        &mut self,
        flight: &FlightKey,
        status: FlightStatus,
        settlement: Settlement,
        flights: &mut FlightRegistry,
        ledger: &mut InsuranceLedger,
        journal: &mut EventJournal,
    ) {
        self.finalized.insert(flight.clone(), status);
        journal.record(SuretyEvent::StatusResolved {
            flight_key: flight.clone(),
            status,
        });
        info!(flight = %flight, status = %status, "Flight status resolved by quorum");

        // status must be applied before policies are settled
        let resolved_at = chrono::Utc::now().timestamp();
        flights.apply_status(flight, status, resolved_at, journal);
        ledger.on_status_resolved(settlement, journal);
    }

    fn draw_indexes(&mut self) -> Vec<u8> {
        rand::seq::index::sample(
            &mut self.rng,
            self.index_space as usize,
            self.indexes_per_oracle,
        )
        .into_iter()
        .map(|index| index as u8)
        .collect()
    }
}
