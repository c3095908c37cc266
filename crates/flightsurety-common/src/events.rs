//! Integration events and the append-only journal
//!
//! Events are the compatibility contract with the transport and UI layers,
//! which poll the journal by sequence number. Payload field names must stay
//! stable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    account::AccountId,
    flight::{FlightKey, FlightStatus},
};

/// Event types emitted by the core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SuretyEvent {
    /// Operational switch flipped by the administrator
    OperationalStatusChanged { operational: bool },
    /// Airline entered PendingApproval
    AirlineNominated {
        airline: AccountId,
        nominated_by: AccountId,
    },
    /// A registered airline voted for a pending nominee
    AirlineApproved {
        airline: AccountId,
        voter: AccountId,
        approvals: usize,
        required: usize,
    },
    /// Airline admitted to the registered set
    AirlineRegistered { airline: AccountId, name: String },
    /// Airline paid its one-time funding
    AirlineFunded { airline: AccountId, amount: Decimal },
    /// Flight registered by its airline
    FlightRegistered { flight_key: FlightKey },
    /// Oracle registered with its assigned indexes
    OracleRegistered { oracle: AccountId, indexes: Vec<u8> },
    /// Status fetch opened; oracles holding `index` are expected to answer
    StatusRequested { flight_key: FlightKey, index: u8 },
    /// An oracle response was accepted into a request bucket
    OracleReport {
        flight_key: FlightKey,
        index: u8,
        oracle: AccountId,
        status: FlightStatus,
    },
    /// Consensus finalized a flight status
    StatusResolved {
        flight_key: FlightKey,
        status: FlightStatus,
    },
    /// Flight record overwritten with a consensus status
    FlightStatusUpdated {
        flight_key: FlightKey,
        status: FlightStatus,
        updated_at: i64,
    },
    /// Passenger bought a policy
    PolicyPurchased {
        passenger: AccountId,
        flight_key: FlightKey,
        amount: Decimal,
    },
    /// Passenger balance credited from a policy payout
    BalanceCredited { passenger: AccountId, amount: Decimal },
    /// Policy escrow forfeited on a non-payable outcome
    PolicyForfeited {
        passenger: AccountId,
        flight_key: FlightKey,
        amount: Decimal,
    },
    /// Passenger withdrew their full balance
    BalanceWithdrawn { passenger: AccountId, amount: Decimal },
}

impl SuretyEvent {
    /// Stable event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            SuretyEvent::OperationalStatusChanged { .. } => "OperationalStatusChanged",
            SuretyEvent::AirlineNominated { .. } => "AirlineNominated",
            SuretyEvent::AirlineApproved { .. } => "AirlineApproved",
            SuretyEvent::AirlineRegistered { .. } => "AirlineRegistered",
            SuretyEvent::AirlineFunded { .. } => "AirlineFunded",
            SuretyEvent::FlightRegistered { .. } => "FlightRegistered",
            SuretyEvent::OracleRegistered { .. } => "OracleRegistered",
            SuretyEvent::StatusRequested { .. } => "StatusRequested",
            SuretyEvent::OracleReport { .. } => "OracleReport",
            SuretyEvent::StatusResolved { .. } => "StatusResolved",
            SuretyEvent::FlightStatusUpdated { .. } => "FlightStatusUpdated",
            SuretyEvent::PolicyPurchased { .. } => "PolicyPurchased",
            SuretyEvent::BalanceCredited { .. } => "BalanceCredited",
            SuretyEvent::PolicyForfeited { .. } => "PolicyForfeited",
            SuretyEvent::BalanceWithdrawn { .. } => "BalanceWithdrawn",
        }
    }
}

/// Journal entry with its position in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequence number, starting at 1
    pub sequence: u64,
    /// Recording time (Unix milliseconds)
    pub recorded_at: i64,
    pub event: SuretyEvent,
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number
    pub fn record(&mut self, event: SuretyEvent) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        self.entries.push(JournalEntry {
            sequence,
            recorded_at: chrono::Utc::now().timestamp_millis(),
            event,
        });
        sequence
    }

    /// Entries with a sequence number strictly greater than `sequence`
    pub fn events_since(&self, sequence: u64) -> &[JournalEntry] {
        let start = (sequence as usize).min(self.entries.len());
        &self.entries[start..]
    }

    /// Sequence number of the newest entry (0 when empty)
    pub fn last_sequence(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }
}
