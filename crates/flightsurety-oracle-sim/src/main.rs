//! FlightSurety oracle simulator binary
//!
//! Boots an engine with four funded airlines and one flight, sells policies,
//! then lets the oracle swarm settle the flight and pays out balances.

use anyhow::{bail, Result};
use flightsurety_common::{AccountId, SuretyParams, VERSION};
use flightsurety_core::{Admission, FlightSurety, SharedSurety};
use flightsurety_oracle_sim::{DeliveryReport, OracleSwarm, SimConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const AIRLINES: usize = 4;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FlightSurety oracle simulator v{}", VERSION);

    let config = SimConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let surety = SharedSurety::new(bootstrap(&config.params, config.rng_seed)?);
    let passengers: Vec<AccountId> = (1..=config.passengers)
        .map(|n| AccountId::from(format!("passenger-{n}")))
        .collect();

    let flight = surety.with(|engine| -> Result<_> {
        let departure = chrono::Utc::now().timestamp();
        let flight = engine.register_flight(&AccountId::from("airline-1"), "ND1309", departure)?;
        for passenger in &passengers {
            engine.buy(passenger, &flight, config.insured_amount)?;
        }
        Ok(flight)
    })?;
    info!(flight = %flight, key = %flight.digest_hex(), "Demo flight insured");

    let mut swarm = OracleSwarm::register(
        surety.clone(),
        config.oracle_count,
        config.params.oracle_registration_fee,
        config.swarm_settings(),
        config.rng_seed,
    )?;

    // keep asking until some index has enough oracles to reach quorum
    let mut total = DeliveryReport::default();
    for attempt in 1..=config.max_requests {
        let index = surety.with(|engine| engine.request_status(&flight))?;
        info!(attempt, index, "Status requested");

        let report = swarm.poll().await;
        total.requests += report.requests;
        total.finalized += report.finalized;
        if report.finalized > 0 {
            break;
        }
        warn!(attempt, index, "No quorum on this index");
    }
    if total.finalized == 0 {
        bail!("no quorum after {} status requests", config.max_requests);
    }

    let engine = surety.lock();
    let status = engine.get_flight(&flight)?.status;
    info!(flight = %flight, status = %status, "Flight settled");
    drop(engine);

    for passenger in &passengers {
        let balance = surety.with(|engine| engine.get_passenger_balance(passenger));
        if balance.is_zero() {
            info!(passenger = %passenger, "No payout");
            continue;
        }
        let paid = surety.with(|engine| engine.withdraw(passenger))?;
        info!(passenger = %passenger, amount = %paid, "Payout withdrawn");
    }

    let engine = surety.lock();
    info!(
        airline_funds = %engine.airline_funds()?,
        oracle_fees = %engine.oracle_fees(),
        "Funds collected"
    );
    info!(
        "Accounting: {}",
        serde_json::to_string_pretty(engine.accounting())?
    );
    info!("Flights: {}", serde_json::to_string_pretty(&engine.get_flights())?);
    info!(events = engine.journal().len(), "Simulation finished");

    Ok(())
}

/// Engine with airlines 1..=4 registered and funded
fn bootstrap(params: &SuretyParams, seed: Option<u64>) -> Result<FlightSurety> {
    let owner = AccountId::from("owner");
    let first = AccountId::from("airline-1");
    let mut engine = FlightSurety::new(owner, first.clone(), "Airline 1", params.clone())?;
    if let Some(seed) = seed {
        engine = engine.with_rng_seed(seed);
    }

    engine.fund_airline(&first, params.min_airline_funding)?;
    for n in 2..=AIRLINES {
        let airline = AccountId::from(format!("airline-{n}"));
        let mut admission = engine.nominate_airline(&first, &airline, &format!("Airline {n}"))?;

        // past the bootstrap phase the earlier airlines vote the nominee in
        for voter in (2..n).map(|v| AccountId::from(format!("airline-{v}"))) {
            if admission == Admission::Registered {
                break;
            }
            admission = engine.approve_airline(&voter, &airline)?;
        }
        engine.fund_airline(&airline, params.min_airline_funding)?;
    }
    info!(airlines = engine.airlines().registered_count(), "Airlines bootstrapped");

    Ok(engine)
}
