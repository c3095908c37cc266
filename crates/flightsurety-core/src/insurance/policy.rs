//! Insurance policy - escrowed premium against one flight
//!
//! A policy settles exactly once:
//! - `Escrowed -> Credited` when the flight is late due to the airline
//! - `Escrowed -> Forfeited` on any other consensus outcome
//!
//! Settled policies never change again, which is what makes crediting
//! idempotent.

use flightsurety_common::{AccountId, Amount, FlightKey, Result, SuretyError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement state of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    /// Premium held, outcome not yet known
    Escrowed,
    /// Payout credited to the passenger balance
    Credited,
    /// Outcome was not payable; premium kept
    Forfeited,
}

/// One passenger's policy on one flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub policy_id: Uuid,
    pub passenger: AccountId,
    pub flight: FlightKey,
    /// Premium paid
    pub amount: Amount,
    pub state: PolicyState,
    /// Amount credited, once credited
    pub payout: Option<Amount>,
    /// Purchase time (Unix milliseconds)
    pub purchased_at: i64,
}

impl InsurancePolicy {
    pub fn new(passenger: AccountId, flight: FlightKey, amount: Amount) -> Self {
        Self {
            policy_id: Uuid::now_v7(),
            passenger,
            flight,
            amount,
            state: PolicyState::Escrowed,
            payout: None,
            purchased_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    #[inline]
    pub fn credited(&self) -> bool {
        self.state == PolicyState::Credited
    }

    #[inline]
    pub fn is_escrowed(&self) -> bool {
        self.state == PolicyState::Escrowed
    }

    /// Payout owed at `multiplier`
    pub fn payout_at(&self, multiplier: Amount) -> Result<Amount> {
        self.amount
            .checked_mul(multiplier)
            .ok_or(SuretyError::AmountOverflow("policy payout"))
    }

    /// Credit `payout`; `None` if already settled
    pub fn credit(&mut self, payout: Amount) -> Option<Amount> {
        if !self.is_escrowed() {
            return None;
        }
        self.state = PolicyState::Credited;
        self.payout = Some(payout);
        Some(payout)
    }

    /// Forfeit the premium; `None` if already settled
    pub fn forfeit(&mut self) -> Option<Amount> {
        if !self.is_escrowed() {
            return None;
        }
        self.state = PolicyState::Forfeited;
        Some(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy(amount: Amount) -> InsurancePolicy {
        InsurancePolicy::new(
            AccountId::from("passenger-1"),
            FlightKey::new(AccountId::from("airline-1"), "ND1309", 100),
            amount,
        )
    }

    #[test]
    fn test_credit_once() {
        let mut p = policy(dec!(1));
        let payout = p.payout_at(dec!(1.5)).unwrap();
        assert_eq!(p.credit(payout), Some(dec!(1.5)));
        assert!(p.credited());
        assert_eq!(p.credit(dec!(1.5)), None);
        assert_eq!(p.payout, Some(dec!(1.5)));
    }

    #[test]
    fn test_forfeited_policy_never_credited() {
        let mut p = policy(dec!(0.4));
        assert_eq!(p.forfeit(), Some(dec!(0.4)));
        assert_eq!(p.credit(dec!(1.5)), None);
        assert_eq!(p.forfeit(), None);
        assert_eq!(p.state, PolicyState::Forfeited);
    }

    #[test]
    fn test_payout_overflow_reported() {
        let p = policy(rust_decimal::Decimal::MAX);
        assert_eq!(
            p.payout_at(dec!(1.5)),
            Err(SuretyError::AmountOverflow("policy payout"))
        );
        assert!(p.is_escrowed());
    }
}
