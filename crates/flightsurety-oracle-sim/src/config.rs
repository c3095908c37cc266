//! Simulator configuration

use anyhow::{Context, Result};
use flightsurety_common::{Amount, SuretyParams};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Oracle swarm simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Oracles registered at startup
    pub oracle_count: usize,
    /// Status code every oracle reports
    pub reported_status: u8,
    /// Premium each simulated passenger pays
    pub insured_amount: Amount,
    /// Simulated passengers buying a policy on the demo flight
    pub passengers: usize,
    /// Upper bound of the random delay before each oracle answers
    pub max_delay_ms: u64,
    /// Extra copies of each response an oracle sends
    pub redeliveries: usize,
    /// Status requests issued before giving up on a quorum
    pub max_requests: usize,
    /// Seed for index draws and delays; OS entropy when unset
    pub rng_seed: Option<u64>,
    /// Engine parameters
    pub params: SuretyParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            oracle_count: 20,
            reported_status: 20,
            insured_amount: Decimal::ONE,
            passengers: 3,
            max_delay_ms: 250,
            redeliveries: 1,
            max_requests: 5,
            rng_seed: None,
            params: SuretyParams::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from `.env` and `SURETY_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) -> Result<()>
        where
            T: std::str::FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid value for {key}: {raw:?}"))?;
            }
            Ok(())
        }

        // Simulation settings
        parse(&lookup, "SURETY_ORACLE_COUNT", &mut cfg.oracle_count)?;
        parse(&lookup, "SURETY_REPORTED_STATUS", &mut cfg.reported_status)?;
        parse(&lookup, "SURETY_INSURED_AMOUNT", &mut cfg.insured_amount)?;
        parse(&lookup, "SURETY_PASSENGERS", &mut cfg.passengers)?;
        parse(&lookup, "SURETY_MAX_DELAY_MS", &mut cfg.max_delay_ms)?;
        parse(&lookup, "SURETY_REDELIVERIES", &mut cfg.redeliveries)?;
        parse(&lookup, "SURETY_MAX_REQUESTS", &mut cfg.max_requests)?;
        if let Some(raw) = lookup("SURETY_RNG_SEED") {
            let seed = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid value for SURETY_RNG_SEED: {raw:?}"))?;
            cfg.rng_seed = Some(seed);
        }

        // Engine parameters
        let params = &mut cfg.params;
        parse(&lookup, "SURETY_QUORUM_THRESHOLD", &mut params.quorum_threshold)?;
        parse(&lookup, "SURETY_INDEX_SPACE", &mut params.index_space)?;
        parse(&lookup, "SURETY_INDEXES_PER_ORACLE", &mut params.indexes_per_oracle)?;
        parse(&lookup, "SURETY_BOOTSTRAP_AIRLINES", &mut params.bootstrap_airlines)?;
        parse(&lookup, "SURETY_MAX_INSURANCE", &mut params.max_insurance)?;
        parse(&lookup, "SURETY_PAYOUT_MULTIPLIER", &mut params.payout_multiplier)?;

        cfg.params.validate()?;
        Ok(cfg)
    }
}
