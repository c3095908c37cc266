//! FlightSurety engine - the public command and query surface
//!
//! Wires the components together and applies the operational guard to every
//! mutating command. Components never write each other's state; the only
//! cross-component writes are the coordinator's settlement calls.

use flightsurety_common::{
    AccountId, Amount, EventJournal, FlightKey, JournalEntry, Result, SuretyParams,
};
use tracing::info;
use uuid::Uuid;

use crate::consensus::{OracleCoordinator, RequestSummary, ResponseOutcome};
use crate::guard::OperationalGuard;
use crate::insurance::{Accounting, InsuranceLedger, InsurancePolicy};
use crate::registry::{Admission, AirlineRegistry, AirlineSummary, Flight, FlightRegistry, FlightSummary};

/// The complete insurance core as one serializable state machine
#[derive(Debug)]
pub struct FlightSurety {
    params: SuretyParams,
    guard: OperationalGuard,
    airlines: AirlineRegistry,
    flights: FlightRegistry,
    oracles: OracleCoordinator,
    insurance: InsuranceLedger,
    journal: EventJournal,
}

impl FlightSurety {
    /// Create an operational engine administered by `admin`, with
    /// `first_airline` registered (but not yet funded)
    pub fn new(
        admin: AccountId,
        first_airline: AccountId,
        first_airline_name: &str,
        params: SuretyParams,
    ) -> Result<Self> {
        params.validate()?;

        let mut journal = EventJournal::new();
        let airlines =
            AirlineRegistry::new(first_airline, first_airline_name, &params, &mut journal);

        info!(admin = %admin, "FlightSurety engine initialized");

        Ok(Self {
            guard: OperationalGuard::new(admin),
            airlines,
            flights: FlightRegistry::new(),
            oracles: OracleCoordinator::new(&params),
            insurance: InsuranceLedger::new(&params),
            journal,
            params,
        })
    }

    /// Seed the oracle index draws for reproducible runs
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.oracles.reseed(seed);
        self
    }

    // ---- queries ----

    pub fn params(&self) -> &SuretyParams {
        &self.params
    }

    pub fn is_operational(&self) -> bool {
        self.guard.is_operational()
    }

    pub fn get_airlines(&self) -> Vec<AirlineSummary> {
        self.airlines.summaries()
    }

    pub fn get_flights(&self) -> Vec<FlightSummary> {
        self.flights.summaries()
    }

    pub fn get_flight(&self, key: &FlightKey) -> Result<&Flight> {
        self.flights.get_flight(key)
    }

    pub fn get_passenger_balance(&self, passenger: &AccountId) -> Amount {
        self.insurance.balance(passenger)
    }

    pub fn get_insured_amount(&self, passenger: &AccountId, flight: &FlightKey) -> Option<Amount> {
        self.insurance.insured_amount(passenger, flight)
    }

    pub fn policies_for_flight(&self, flight: &FlightKey) -> Vec<&InsurancePolicy> {
        self.insurance.policies_for_flight(flight)
    }

    pub fn get_oracle_indexes(&self, oracle: &AccountId) -> Result<&[u8]> {
        self.oracles.oracle_indexes(oracle)
    }

    pub fn oracles_for_index(&self, index: u8) -> Vec<AccountId> {
        self.oracles.oracles_for_index(index)
    }

    pub fn get_responses(&self, flight: &FlightKey) -> Vec<RequestSummary> {
        self.oracles.responses(flight)
    }

    pub fn accounting(&self) -> &Accounting {
        self.insurance.accounting()
    }

    pub fn airlines(&self) -> &AirlineRegistry {
        &self.airlines
    }

    /// Funding paid in by all airlines
    pub fn airline_funds(&self) -> Result<Amount> {
        self.airlines.total_funds()
    }

    /// Registration fees paid in by all oracles
    pub fn oracle_fees(&self) -> Amount {
        self.oracles.roster().fees_collected()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn events_since(&self, sequence: u64) -> &[JournalEntry] {
        self.journal.events_since(sequence)
    }

    // ---- commands ----

    /// Administrator-only; allowed while disabled
    pub fn set_operational(&mut self, caller: &AccountId, operational: bool) -> Result<()> {
        self.guard
            .set_operational(caller, operational, &mut self.journal)
    }

    pub fn nominate_airline(
        &mut self,
        nominator: &AccountId,
        airline: &AccountId,
        name: &str,
    ) -> Result<Admission> {
        self.guard.ensure_operational()?;
        self.airlines
            .nominate(nominator, airline, name, &mut self.journal)
    }

    pub fn approve_airline(&mut self, voter: &AccountId, airline: &AccountId) -> Result<Admission> {
        self.guard.ensure_operational()?;
        self.airlines.approve(voter, airline, &mut self.journal)
    }

    pub fn fund_airline(&mut self, airline: &AccountId, amount: Amount) -> Result<()> {
        self.guard.ensure_operational()?;
        self.airlines.fund(airline, amount, &mut self.journal)
    }

    pub fn register_flight(
        &mut self,
        airline: &AccountId,
        code: &str,
        departure: i64,
    ) -> Result<FlightKey> {
        self.guard.ensure_operational()?;
        self.flights
            .register_flight(&self.airlines, airline, code, departure, &mut self.journal)
    }

    pub fn register_oracle(&mut self, oracle: &AccountId, fee: Amount) -> Result<Vec<u8>> {
        self.guard.ensure_operational()?;
        self.oracles.register_oracle(oracle, fee, &mut self.journal)
    }

    /// Open a status request for a registered flight; returns the index
    /// whose oracles are expected to answer
    pub fn request_status(&mut self, flight: &FlightKey) -> Result<u8> {
        self.guard.ensure_operational()?;
        self.flights.get_flight(flight)?;
        Ok(self.oracles.request_status(flight, &mut self.journal))
    }

    pub fn submit_response(
        &mut self,
        oracle: &AccountId,
        index: u8,
        flight: &FlightKey,
        status_code: u8,
    ) -> Result<ResponseOutcome> {
        self.guard.ensure_operational()?;
        self.oracles.submit_response(
            oracle,
            index,
            flight,
            status_code,
            &mut self.flights,
            &mut self.insurance,
            &mut self.journal,
        )
    }

    pub fn buy(&mut self, passenger: &AccountId, flight: &FlightKey, amount: Amount) -> Result<Uuid> {
        self.guard.ensure_operational()?;
        self.insurance
            .buy(&self.flights, passenger, flight, amount, &mut self.journal)
    }

    /// Zero the passenger's balance and return the amount to transfer out
    pub fn withdraw(&mut self, passenger: &AccountId) -> Result<Amount> {
        self.guard.ensure_operational()?;
        self.insurance.withdraw(passenger, &mut self.journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsurety_common::{SuretyError, SuretyEvent};
    use rust_decimal_macros::dec;

    fn id(name: &str) -> AccountId {
        AccountId::from(name)
    }

    fn engine() -> FlightSurety {
        FlightSurety::new(id("owner"), id("a1"), "Airline 1", SuretyParams::default())
            .unwrap()
            .with_rng_seed(42)
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = SuretyParams {
            quorum_threshold: 0,
            ..Default::default()
        };
        let result = FlightSurety::new(id("owner"), id("a1"), "Airline 1", params);
        assert!(matches!(result, Err(SuretyError::Config(_))));
    }

    #[test]
    fn test_disabled_blocks_commands_not_queries() {
        let mut surety = engine();
        surety.set_operational(&id("owner"), false).unwrap();

        assert!(!surety.is_operational());
        assert_eq!(
            surety.fund_airline(&id("a1"), dec!(10)),
            Err(SuretyError::OperationalDisabled)
        );
        assert_eq!(
            surety.register_oracle(&id("oracle"), dec!(1)),
            Err(SuretyError::OperationalDisabled)
        );
        assert_eq!(surety.get_airlines().len(), 1);
        assert!(!surety.get_airlines()[0].funded);

        surety.set_operational(&id("owner"), true).unwrap();
        surety.fund_airline(&id("a1"), dec!(10)).unwrap();
    }

    #[test]
    fn test_request_status_requires_registered_flight() {
        let mut surety = engine();
        let ghost = FlightKey::new(id("a1"), "ND1309", 1);
        assert!(matches!(
            surety.request_status(&ghost),
            Err(SuretyError::FlightNotFound(_))
        ));
    }

    #[test]
    fn test_request_status_emits_event() {
        let mut surety = engine();
        surety.fund_airline(&id("a1"), dec!(10)).unwrap();
        let flight = surety.register_flight(&id("a1"), "ND1309", 1_700_000_000).unwrap();

        let seq = surety.journal().last_sequence();
        let index = surety.request_status(&flight).unwrap();
        assert!(index < 10);

        let events = surety.events_since(seq);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].event,
            SuretyEvent::StatusRequested {
                flight_key: flight,
                index
            }
        );
    }

    #[test]
    fn test_collected_funds_and_fees() {
        let mut surety = engine();
        assert_eq!(surety.airline_funds(), Ok(Amount::ZERO));
        assert_eq!(surety.oracle_fees(), Amount::ZERO);

        surety.fund_airline(&id("a1"), dec!(12)).unwrap();
        surety.register_oracle(&id("oracle-1"), dec!(1)).unwrap();
        surety.register_oracle(&id("oracle-2"), dec!(2.5)).unwrap();
        assert_eq!(
            surety.register_oracle(&id("oracle-3"), dec!(0.5)),
            Err(SuretyError::InsufficientFunds {
                provided: dec!(0.5),
                required: dec!(1)
            })
        );

        assert_eq!(surety.airline_funds(), Ok(dec!(12)));
        assert_eq!(surety.oracle_fees(), dec!(3.5));
    }
}
