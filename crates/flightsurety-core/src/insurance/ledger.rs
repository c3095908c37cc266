//! Insurance ledger
//!
//! Holds every policy and passenger balance. Balances only grow through
//! consensus-driven credits and only shrink through a full withdrawal.
//!
//! Fund accounting:
//! - premiums: `paid == escrowed + settled_principal + forfeited`
//! - payouts: `credited == withdrawn + Σ balances`

use std::collections::{BTreeMap, HashMap};

use flightsurety_common::{
    AccountId, Amount, EventJournal, FlightKey, FlightStatus, Result, SuretyError, SuretyEvent,
    SuretyParams,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::insurance::policy::InsurancePolicy;
use crate::registry::flights::FlightRegistry;

/// Running fund totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounting {
    /// Premiums ever accepted by `buy`
    pub premiums_paid: Amount,
    /// Premiums of policies not yet settled
    pub escrowed: Amount,
    /// Premiums of policies that were credited
    pub settled_principal: Amount,
    /// Premiums of policies settled without payout
    pub forfeited: Amount,
    /// Payouts credited to balances (principal times multiplier)
    pub credited: Amount,
    /// Balances paid out to passengers
    pub withdrawn: Amount,
}

impl Accounting {
    /// Every premium is escrowed, settled or forfeited
    pub fn premiums_conserved(&self) -> bool {
        self.premiums_paid == self.escrowed + self.settled_principal + self.forfeited
    }
}

/// Payout owed to one passenger by a settlement
#[derive(Debug, Clone)]
struct Credit {
    passenger: AccountId,
    payout: Amount,
    /// Passenger balance once the payout lands
    balance: Amount,
}

/// Settlement of one flight, computed up front so applying it cannot fail
#[derive(Debug, Clone)]
pub(crate) struct Settlement {
    flight: FlightKey,
    status: FlightStatus,
    credits: Vec<Credit>,
    /// Totals once the settlement is applied
    accounting: Accounting,
    total_credited: Amount,
}

fn checked_add(total: Amount, amount: Amount, what: &'static str) -> Result<Amount> {
    total
        .checked_add(amount)
        .ok_or(SuretyError::AmountOverflow(what))
}

/// Policies, balances and payout rules
#[derive(Debug)]
pub struct InsuranceLedger {
    max_insurance: Amount,
    payout_multiplier: Amount,
    policies: HashMap<FlightKey, BTreeMap<AccountId, InsurancePolicy>>,
    balances: HashMap<AccountId, Amount>,
    accounting: Accounting,
}

impl InsuranceLedger {
    pub fn new(params: &SuretyParams) -> Self {
        Self {
            max_insurance: params.max_insurance,
            payout_multiplier: params.payout_multiplier,
            policies: HashMap::new(),
            balances: HashMap::new(),
            accounting: Accounting::default(),
        }
    }

    /// Buy a policy on a registered, unsettled flight
    #[instrument(skip(self, flights, journal))]
    pub fn buy(
        &mut self,
        flights: &FlightRegistry,
        passenger: &AccountId,
        flight: &FlightKey,
        amount: Amount,
        journal: &mut EventJournal,
    ) -> Result<Uuid> {
        if amount <= Decimal::ZERO || amount > self.max_insurance {
            return Err(SuretyError::InvalidAmount {
                amount,
                cap: self.max_insurance,
            });
        }
        if !flights.contains(flight) {
            return Err(SuretyError::FlightNotFound(flight.clone()));
        }
        if flights.is_settled(flight) {
            return Err(SuretyError::FlightSettled(flight.clone()));
        }
        if self.policy(passenger, flight).is_some() {
            return Err(SuretyError::AlreadyInsured {
                passenger: passenger.clone(),
                flight: flight.clone(),
            });
        }

        let premiums_paid = checked_add(self.accounting.premiums_paid, amount, "premiums paid")?;
        let escrowed = checked_add(self.accounting.escrowed, amount, "escrow")?;

        let policy = InsurancePolicy::new(passenger.clone(), flight.clone(), amount);
        let policy_id = policy.policy_id;
        self.policies
            .entry(flight.clone())
            .or_default()
            .insert(passenger.clone(), policy);

        self.accounting.premiums_paid = premiums_paid;
        self.accounting.escrowed = escrowed;
        journal.record(SuretyEvent::PolicyPurchased {
            passenger: passenger.clone(),
            flight_key: flight.clone(),
            amount,
        });
        info!(passenger = %passenger, flight = %flight, amount = %amount, "Policy purchased");

        Ok(policy_id)
    }

    /// Work out the settlement of every escrowed policy on a resolved flight
    ///
    /// Pays `amount * payout_multiplier` on `LateAirline`, forfeits otherwise.
    /// Nothing is written, so an overflow here leaves the ledger untouched.
    pub(crate) fn plan_settlement(
        &self,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<Settlement> {
        let mut accounting = self.accounting.clone();
        let mut credits = Vec::new();
        let mut total_credited = Decimal::ZERO;

        let escrowed = self
            .policies
            .get(flight)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|policy| policy.is_escrowed());

        for policy in escrowed {
            accounting.escrowed -= policy.amount;
            if !status.is_payable() {
                accounting.forfeited = checked_add(accounting.forfeited, policy.amount, "forfeits")?;
                continue;
            }

            let payout = policy.payout_at(self.payout_multiplier)?;
            let balance = checked_add(self.balance(&policy.passenger), payout, "passenger balance")?;
            accounting.settled_principal =
                checked_add(accounting.settled_principal, policy.amount, "settled principal")?;
            accounting.credited = checked_add(accounting.credited, payout, "credited payouts")?;
            total_credited = checked_add(total_credited, payout, "credited payouts")?;
            credits.push(Credit {
                passenger: policy.passenger.clone(),
                payout,
                balance,
            });
        }

        Ok(Settlement {
            flight: flight.clone(),
            status,
            credits,
            accounting,
            total_credited,
        })
    }

    /// Apply a planned settlement
    ///
    /// Settled policies are skipped, so applying a stale or repeated plan
    /// credits nothing twice. Returns the total credited.
    pub(crate) fn on_status_resolved(
        &mut self,
        settlement: Settlement,
        journal: &mut EventJournal,
    ) -> Amount {
        let Settlement {
            flight,
            status,
            credits,
            accounting,
            total_credited,
        } = settlement;

        let Some(policies) = self.policies.get_mut(&flight) else {
            debug!(flight = %flight, "No policies to settle");
            return Decimal::ZERO;
        };
        if !policies.values().any(InsurancePolicy::is_escrowed) {
            debug!(flight = %flight, "Policies already settled");
            return Decimal::ZERO;
        }

        if status.is_payable() {
            for credit in credits {
                let Some(policy) = policies.get_mut(&credit.passenger) else {
                    continue;
                };
                if policy.credit(credit.payout).is_none() {
                    continue;
                }
                self.balances.insert(credit.passenger.clone(), credit.balance);

                journal.record(SuretyEvent::BalanceCredited {
                    passenger: credit.passenger.clone(),
                    amount: credit.payout,
                });
                info!(passenger = %credit.passenger, amount = %credit.payout, "Balance credited");
            }
        } else {
            for policy in policies.values_mut() {
                let Some(premium) = policy.forfeit() else {
                    continue;
                };
                journal.record(SuretyEvent::PolicyForfeited {
                    passenger: policy.passenger.clone(),
                    flight_key: flight.clone(),
                    amount: premium,
                });
                debug!(passenger = %policy.passenger, status = %status, "Policy forfeited");
            }
        }

        self.accounting = accounting;
        total_credited
    }

    /// Withdraw a passenger's full balance
    #[instrument(skip(self, journal))]
    pub fn withdraw(&mut self, passenger: &AccountId, journal: &mut EventJournal) -> Result<Amount> {
        let amount = self.balance(passenger);
        if amount <= Decimal::ZERO {
            return Err(SuretyError::NothingToWithdraw(passenger.clone()));
        }
        let withdrawn = checked_add(self.accounting.withdrawn, amount, "withdrawals")?;

        self.balances.remove(passenger);
        self.accounting.withdrawn = withdrawn;
        journal.record(SuretyEvent::BalanceWithdrawn {
            passenger: passenger.clone(),
            amount,
        });
        info!(passenger = %passenger, amount = %amount, "Balance withdrawn");

        Ok(amount)
    }

    pub fn balance(&self, passenger: &AccountId) -> Amount {
        self.balances.get(passenger).copied().unwrap_or_default()
    }

    pub fn total_balances(&self) -> Amount {
        self.balances.values().copied().sum()
    }

    pub fn policy(&self, passenger: &AccountId, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies.get(flight).and_then(|p| p.get(passenger))
    }

    /// Premium a passenger paid on a flight, if insured
    pub fn insured_amount(&self, passenger: &AccountId, flight: &FlightKey) -> Option<Amount> {
        self.policy(passenger, flight).map(|p| p.amount)
    }

    /// Policies on a flight, ordered by passenger
    pub fn policies_for_flight(&self, flight: &FlightKey) -> Vec<&InsurancePolicy> {
        self.policies
            .get(flight)
            .map(|p| p.values().collect())
            .unwrap_or_default()
    }

    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }
}
