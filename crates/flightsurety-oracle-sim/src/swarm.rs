//! Oracle swarm
//!
//! Registers a set of oracles with the engine and answers every
//! `StatusRequested` event it observes. Each oracle holding the requested
//! index answers from its own task after a random delay, possibly more than
//! once, so responses arrive concurrently, out of order and duplicated.

use std::time::Duration;

use flightsurety_common::{AccountId, Amount, FlightKey, Result, SuretyEvent};
use flightsurety_core::{ResponseOutcome, SharedSurety};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// What happened to one delivered response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Accepted,
    Duplicate,
    Resolved { finalized: bool },
    Late,
    Rejected,
}

/// Tally of delivered responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Status requests answered
    pub requests: usize,
    /// Responses counted toward a quorum
    pub accepted: usize,
    /// Repeated responses the engine ignored
    pub duplicates: usize,
    /// Responses that completed a quorum
    pub resolved: usize,
    /// Quorums that finalized a flight
    pub finalized: usize,
    /// Responses arriving after their request resolved
    pub late: usize,
    /// Responses the engine refused
    pub rejected: usize,
}

impl DeliveryReport {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Accepted => self.accepted += 1,
            Delivery::Duplicate => self.duplicates += 1,
            Delivery::Resolved { finalized } => {
                self.resolved += 1;
                if finalized {
                    self.finalized += 1;
                }
            }
            Delivery::Late => self.late += 1,
            Delivery::Rejected => self.rejected += 1,
        }
    }

    fn merge(&mut self, other: &DeliveryReport) {
        self.requests += other.requests;
        self.accepted += other.accepted;
        self.duplicates += other.duplicates;
        self.resolved += other.resolved;
        self.finalized += other.finalized;
        self.late += other.late;
        self.rejected += other.rejected;
    }
}

/// Swarm behaviour
#[derive(Debug, Clone)]
pub struct SwarmSettings {
    pub reported_status: u8,
    pub max_delay: Duration,
    pub redeliveries: usize,
}

/// Simulated oracle servers sharing one engine
#[derive(Debug)]
pub struct OracleSwarm {
    surety: SharedSurety,
    oracles: Vec<(AccountId, Vec<u8>)>,
    settings: SwarmSettings,
    /// Last journal sequence already dispatched
    cursor: u64,
    rng: StdRng,
}

impl OracleSwarm {
    /// Register `count` oracles, each paying `fee`
    ///
    /// Events already in the journal are skipped; only requests opened after
    /// registration are answered.
    #[instrument(skip(surety, settings, seed))]
    pub fn register(
        surety: SharedSurety,
        count: usize,
        fee: Amount,
        settings: SwarmSettings,
        seed: Option<u64>,
    ) -> Result<Self> {
        let (oracles, cursor) = surety.with(|engine| -> Result<_> {
            let mut oracles = Vec::with_capacity(count);
            for n in 0..count {
                let oracle = AccountId::from(format!("oracle-{n:02}"));
                let indexes = engine.register_oracle(&oracle, fee)?;
                oracles.push((oracle, indexes));
            }
            Ok((oracles, engine.journal().last_sequence()))
        })?;
        info!(oracles = oracles.len(), "Oracle swarm registered");

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            surety,
            oracles,
            settings,
            cursor,
            rng,
        })
    }

    /// Oracles whose index set contains `index`
    pub fn holders(&self, index: u8) -> impl Iterator<Item = &AccountId> {
        self.oracles
            .iter()
            .filter(move |(_, indexes)| indexes.contains(&index))
            .map(|(oracle, _)| oracle)
    }

    /// Answer every status request recorded since the last poll and wait for
    /// all deliveries to land
    pub async fn poll(&mut self) -> DeliveryReport {
        let requests: Vec<(FlightKey, u8)> = self.surety.with(|engine| {
            let pending: Vec<(FlightKey, u8)> = engine
                .events_since(self.cursor)
                .iter()
                .filter_map(|entry| match &entry.event {
                    SuretyEvent::StatusRequested { flight_key, index } => {
                        Some((flight_key.clone(), *index))
                    }
                    _ => None,
                })
                .collect();
            self.cursor = engine.journal().last_sequence();
            pending
        });

        let mut report = DeliveryReport::default();
        for (flight, index) in requests {
            report.merge(&self.answer(flight, index).await);
        }
        report
    }

    /// Have every holder of `index` report on `flight` concurrently
    #[instrument(skip(self, flight), fields(flight = %flight))]
    pub async fn answer(&mut self, flight: FlightKey, index: u8) -> DeliveryReport {
        let mut tasks = JoinSet::new();
        let max_delay_ms = self.settings.max_delay.as_millis() as u64;
        let holders: Vec<AccountId> = self.holders(index).cloned().collect();
        debug!(holders = holders.len(), "Dispatching oracle responses");

        for oracle in holders {
            let delays: Vec<Duration> = (0..=self.settings.redeliveries)
                .map(|_| Duration::from_millis(self.rng.gen_range(0..=max_delay_ms)))
                .collect();
            let surety = self.surety.clone();
            let flight = flight.clone();
            let code = self.settings.reported_status;

            tasks.spawn(async move {
                let mut deliveries = Vec::with_capacity(delays.len());
                for delay in delays {
                    tokio::time::sleep(delay).await;
                    deliveries.push(deliver(&surety, &oracle, index, &flight, code));
                }
                deliveries
            });
        }

        let mut report = DeliveryReport {
            requests: 1,
            ..Default::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(deliveries) => deliveries.into_iter().for_each(|d| report.record(d)),
                Err(err) => warn!(error = %err, "Oracle task failed"),
            }
        }
        info!(?report, "Status request answered");
        report
    }
}

/// Submit one response; the lock is released before returning
fn deliver(
    surety: &SharedSurety,
    oracle: &AccountId,
    index: u8,
    flight: &FlightKey,
    code: u8,
) -> Delivery {
    match surety.with(|engine| engine.submit_response(oracle, index, flight, code)) {
        Ok(ResponseOutcome::Accepted { matching, required, .. }) => {
            debug!(oracle = %oracle, matching, required, "Response accepted");
            Delivery::Accepted
        }
        Ok(ResponseOutcome::Duplicate) => Delivery::Duplicate,
        Ok(ResponseOutcome::Resolved { status, finalized }) => {
            info!(oracle = %oracle, status = %status, finalized, "Response completed quorum");
            Delivery::Resolved { finalized }
        }
        Err(err) if err.is_ignorable() => {
            debug!(oracle = %oracle, "Late response ignored");
            Delivery::Late
        }
        Err(err) => {
            warn!(oracle = %oracle, error = %err, "Response rejected");
            Delivery::Rejected
        }
    }
}
