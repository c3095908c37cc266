//! Tunable protocol parameters
//!
//! Quorum sizes, index space and monetary limits are not fixed by any
//! authority; they default to the values the platform launched with and can
//! be overridden per deployment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SuretyError};

/// Protocol parameters shared by every core component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyParams {
    /// Airlines admitted without a vote while fewer than this many are registered
    pub bootstrap_airlines: usize,
    /// Minimum one-time funding an airline must provide to participate
    pub min_airline_funding: Decimal,
    /// Per-policy insurance cap
    pub max_insurance: Decimal,
    /// Credit paid per unit of premium on an airline-caused delay
    pub payout_multiplier: Decimal,
    /// Fee an oracle pays to register
    pub oracle_registration_fee: Decimal,
    /// Size of the oracle index space
    pub index_space: u8,
    /// Distinct indexes assigned to each oracle
    pub indexes_per_oracle: usize,
    /// Matching responses needed to resolve a status request
    pub quorum_threshold: usize,
}

impl Default for SuretyParams {
    fn default() -> Self {
        Self {
            bootstrap_airlines: crate::BOOTSTRAP_AIRLINES,
            min_airline_funding: Decimal::TEN,
            max_insurance: Decimal::ONE,
            payout_multiplier: Decimal::new(15, 1),
            oracle_registration_fee: Decimal::ONE,
            index_space: crate::INDEX_SPACE,
            indexes_per_oracle: crate::INDEXES_PER_ORACLE,
            quorum_threshold: crate::QUORUM_THRESHOLD,
        }
    }
}

impl SuretyParams {
    /// Reject parameter sets the core cannot operate under
    pub fn validate(&self) -> Result<()> {
        if self.index_space == 0 {
            return Err(SuretyError::Config("index_space must be positive".into()));
        }
        if self.indexes_per_oracle == 0 || self.indexes_per_oracle > self.index_space as usize {
            return Err(SuretyError::Config(format!(
                "indexes_per_oracle must be in 1..={}, got {}",
                self.index_space, self.indexes_per_oracle
            )));
        }
        if self.quorum_threshold == 0 {
            return Err(SuretyError::Config("quorum_threshold must be positive".into()));
        }
        if self.max_insurance <= Decimal::ZERO {
            return Err(SuretyError::Config("max_insurance must be positive".into()));
        }
        if self.payout_multiplier < Decimal::ONE {
            return Err(SuretyError::Config(format!(
                "payout_multiplier must be at least 1, got {}",
                self.payout_multiplier
            )));
        }
        if self
            .max_insurance
            .checked_mul(self.payout_multiplier)
            .is_none()
        {
            return Err(SuretyError::Config(format!(
                "max_insurance {} times payout_multiplier {} is not representable",
                self.max_insurance, self.payout_multiplier
            )));
        }
        if self.min_airline_funding < Decimal::ZERO || self.oracle_registration_fee < Decimal::ZERO
        {
            return Err(SuretyError::Config("fees must not be negative".into()));
        }
        Ok(())
    }

    /// Approvals a nominee needs when `registered` airlines are admitted:
    /// half of them, rounded up.
    #[inline]
    pub fn approvals_required(registered: usize) -> usize {
        registered.div_ceil(2)
    }
}
