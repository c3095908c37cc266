//! Airline admission
//!
//! Admission follows a bootstrap-then-vote rule:
//! - While fewer than `bootstrap_airlines` airlines are registered, a
//!   participating airline admits a nominee on its own.
//! - After that, a nominee stays `PendingApproval` until distinct
//!   participating airlines amounting to half the registered set (rounded
//!   up) have approved it. The nominator counts as the first approver.
//!
//! Only airlines that are both registered and funded may nominate, vote or
//! register flights.

use std::collections::HashMap;

use flightsurety_common::{
    AccountId, Amount, EventJournal, Result, SuretyError, SuretyEvent, SuretyParams,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Admission state of an airline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionState {
    PendingApproval,
    Registered,
}

/// Airline record owned by [`AirlineRegistry`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub id: AccountId,
    pub name: String,
    pub state: AdmissionState,
    pub funded: bool,
    /// Funding paid, zero until funded
    pub funds: Amount,
    /// Distinct approvers, nominator first
    pub approvers: Vec<AccountId>,
}

impl Airline {
    fn nominee(id: AccountId, name: String, nominator: AccountId) -> Self {
        Self {
            id,
            name,
            state: AdmissionState::PendingApproval,
            funded: false,
            funds: Decimal::ZERO,
            approvers: vec![nominator],
        }
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.state == AdmissionState::Registered
    }

    /// Registered and funded
    #[inline]
    pub fn can_participate(&self) -> bool {
        self.is_registered() && self.funded
    }

    pub fn has_approved(&self, voter: &AccountId) -> bool {
        self.approvers.contains(voter)
    }
}

/// Read-only airline view for external collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirlineSummary {
    pub id: AccountId,
    pub name: String,
    pub registered: bool,
    pub funded: bool,
    pub approvals: usize,
}

impl From<&Airline> for AirlineSummary {
    fn from(airline: &Airline) -> Self {
        Self {
            id: airline.id.clone(),
            name: airline.name.clone(),
            registered: airline.is_registered(),
            funded: airline.funded,
            approvals: airline.approvers.len(),
        }
    }
}

/// Result of a nomination or approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The nominee is (now or already) registered
    Registered,
    /// The nominee still needs more approvals
    Pending { approvals: usize, required: usize },
}

/// Airline lifecycle and admission voting
#[derive(Debug)]
pub struct AirlineRegistry {
    bootstrap_airlines: usize,
    min_funding: Amount,
    airlines: HashMap<AccountId, Airline>,
    /// Registered airlines in admission order
    registered: Vec<AccountId>,
}

impl AirlineRegistry {
    /// Create a registry whose first airline is registered but not yet funded
    pub fn new(
        first_airline: AccountId,
        name: impl Into<String>,
        params: &SuretyParams,
        journal: &mut EventJournal,
    ) -> Self {
        let name = name.into();
        let genesis = Airline {
            id: first_airline.clone(),
            name: name.clone(),
            state: AdmissionState::Registered,
            funded: false,
            funds: Decimal::ZERO,
            approvers: Vec::new(),
        };

        journal.record(SuretyEvent::AirlineRegistered {
            airline: first_airline.clone(),
            name,
        });
        info!(airline = %first_airline, "Genesis airline registered");

        Self {
            bootstrap_airlines: params.bootstrap_airlines,
            min_funding: params.min_airline_funding,
            airlines: HashMap::from([(first_airline.clone(), genesis)]),
            registered: vec![first_airline],
        }
    }

    pub fn get(&self, id: &AccountId) -> Option<&Airline> {
        self.airlines.get(id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn is_registered(&self, id: &AccountId) -> bool {
        self.airlines.get(id).is_some_and(Airline::is_registered)
    }

    pub fn can_participate(&self, id: &AccountId) -> bool {
        self.airlines.get(id).is_some_and(Airline::can_participate)
    }

    /// Fail with `Unauthorized` unless `id` is a registered, funded airline
    pub fn ensure_participating(&self, id: &AccountId) -> Result<()> {
        if self.can_participate(id) {
            Ok(())
        } else {
            Err(SuretyError::Unauthorized { caller: id.clone() })
        }
    }

    /// All airlines: registered ones in admission order, then pending nominees by id
    pub fn summaries(&self) -> Vec<AirlineSummary> {
        let mut pending: Vec<&Airline> = self
            .airlines
            .values()
            .filter(|a| !a.is_registered())
            .collect();
        pending.sort_by(|a, b| a.id.cmp(&b.id));

        self.registered
            .iter()
            .filter_map(|id| self.airlines.get(id))
            .chain(pending)
            .map(AirlineSummary::from)
            .collect()
    }

    /// Total funding paid in by airlines
    pub fn total_funds(&self) -> Result<Amount> {
        self.airlines
            .values()
            .try_fold(Amount::ZERO, |total, airline| total.checked_add(airline.funds))
            .ok_or(SuretyError::AmountOverflow("airline funds"))
    }

    /// Nominate a new airline
    ///
    /// Nominating an airline that is already pending counts as an approval
    /// vote from the nominator.
    #[instrument(skip(self, journal))]
    pub fn nominate(
        &mut self,
        nominator: &AccountId,
        airline: &AccountId,
        name: &str,
        journal: &mut EventJournal,
    ) -> Result<Admission> {
        self.ensure_participating(nominator)?;

        if let Some(existing) = self.airlines.get(airline) {
            if existing.is_registered() {
                return Err(SuretyError::AlreadyRegistered(airline.clone()));
            }
            debug!(airline = %airline, "Re-nomination of pending airline counted as approval");
            return self.approve(nominator, airline, journal);
        }

        self.airlines.insert(
            airline.clone(),
            Airline::nominee(airline.clone(), name.to_string(), nominator.clone()),
        );

        if self.registered_count() < self.bootstrap_airlines {
            self.promote(airline, journal);
            return Ok(Admission::Registered);
        }

        journal.record(SuretyEvent::AirlineNominated {
            airline: airline.clone(),
            nominated_by: nominator.clone(),
        });
        info!(airline = %airline, nominator = %nominator, "Airline pending approval");

        Ok(self.settle_votes(airline, journal))
    }

    /// Record an approval vote for a pending nominee
    ///
    /// Votes arriving after the nominee is registered are accepted as no-ops.
    #[instrument(skip(self, journal))]
    pub fn approve(
        &mut self,
        voter: &AccountId,
        airline: &AccountId,
        journal: &mut EventJournal,
    ) -> Result<Admission> {
        self.ensure_participating(voter)?;

        let required = SuretyParams::approvals_required(self.registered_count());
        let nominee = self
            .airlines
            .get_mut(airline)
            .ok_or_else(|| SuretyError::AirlineNotFound(airline.clone()))?;

        if nominee.is_registered() {
            debug!(airline = %airline, voter = %voter, "Late approval ignored");
            return Ok(Admission::Registered);
        }

        if nominee.has_approved(voter) {
            return Err(SuretyError::DuplicateVote {
                voter: voter.clone(),
                nominee: airline.clone(),
            });
        }

        nominee.approvers.push(voter.clone());
        journal.record(SuretyEvent::AirlineApproved {
            airline: airline.clone(),
            voter: voter.clone(),
            approvals: nominee.approvers.len(),
            required,
        });

        Ok(self.settle_votes(airline, journal))
    }

    /// Pay the one-time funding that lets a registered airline participate
    #[instrument(skip(self, journal))]
    pub fn fund(
        &mut self,
        airline: &AccountId,
        amount: Amount,
        journal: &mut EventJournal,
    ) -> Result<()> {
        let min_funding = self.min_funding;
        let record = self
            .airlines
            .get_mut(airline)
            .ok_or_else(|| SuretyError::AirlineNotFound(airline.clone()))?;

        if !record.is_registered() {
            return Err(SuretyError::Unauthorized {
                caller: airline.clone(),
            });
        }
        if amount < min_funding {
            return Err(SuretyError::InsufficientFunds {
                provided: amount,
                required: min_funding,
            });
        }
        if record.funded {
            return Err(SuretyError::AlreadyFunded(airline.clone()));
        }

        record.funded = true;
        record.funds = amount;
        journal.record(SuretyEvent::AirlineFunded {
            airline: airline.clone(),
            amount,
        });
        info!(airline = %airline, amount = %amount, "Airline funded");
        Ok(())
    }

    /// Promote the nominee if its approvals meet the current quorum
    fn settle_votes(&mut self, airline: &AccountId, journal: &mut EventJournal) -> Admission {
        let required = SuretyParams::approvals_required(self.registered_count());
        let approvals = self.airlines.get(airline).map_or(0, |a| a.approvers.len());

        if approvals >= required {
            self.promote(airline, journal);
            Admission::Registered
        } else {
            Admission::Pending {
                approvals,
                required,
            }
        }
    }

    fn promote(&mut self, airline: &AccountId, journal: &mut EventJournal) {
        let Some(record) = self.airlines.get_mut(airline) else {
            return;
        };
        if record.is_registered() {
            return;
        }

        record.state = AdmissionState::Registered;
        self.registered.push(airline.clone());
        journal.record(SuretyEvent::AirlineRegistered {
            airline: airline.clone(),
            name: record.name.clone(),
        });
        info!(
            airline = %airline,
            approvals = record.approvers.len(),
            registered = self.registered.len(),
            "Airline registered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn id(name: &str) -> AccountId {
        AccountId::from(name)
    }

    /// Registry with `count` registered, funded airlines named a1..a{count}
    fn funded_registry(count: usize, journal: &mut EventJournal) -> AirlineRegistry {
        let mut registry =
            AirlineRegistry::new(id("a1"), "Airline 1", &SuretyParams::default(), journal);
        registry.fund(&id("a1"), dec!(10), journal).unwrap();
        for n in 2..=count {
            let airline = id(&format!("a{n}"));
            let admission = registry
                .nominate(&id("a1"), &airline, &format!("Airline {n}"), journal)
                .unwrap();
            if admission != Admission::Registered {
                for voter in 2..n {
                    let voter = id(&format!("a{voter}"));
                    if registry.approve(&voter, &airline, journal).unwrap() == Admission::Registered {
                        break;
                    }
                }
            }
            registry.fund(&airline, dec!(10), journal).unwrap();
        }
        registry
    }

    #[test]
    fn test_unfunded_airline_cannot_nominate() {
        let mut journal = EventJournal::new();
        let mut registry =
            AirlineRegistry::new(id("a1"), "Airline 1", &SuretyParams::default(), &mut journal);

        let result = registry.nominate(&id("a1"), &id("a2"), "Airline 2", &mut journal);
        assert!(matches!(result, Err(SuretyError::Unauthorized { .. })));
        assert!(registry.get(&id("a2")).is_none());
    }

    #[test]
    fn test_bootstrap_airlines_register_without_vote() {
        let mut journal = EventJournal::new();
        let registry = funded_registry(4, &mut journal);

        assert_eq!(registry.registered_count(), 4);
        for n in 1..=4 {
            assert!(registry.can_participate(&id(&format!("a{n}"))));
        }
    }

    #[test]
    fn test_fifth_airline_needs_half_of_registered() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);

        let admission = registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();
        assert_eq!(
            admission,
            Admission::Pending {
                approvals: 1,
                required: 2
            }
        );
        assert!(!registry.is_registered(&id("a5")));

        let admission = registry.approve(&id("a2"), &id("a5"), &mut journal).unwrap();
        assert_eq!(admission, Admission::Registered);
        assert!(registry.is_registered(&id("a5")));
        assert_eq!(registry.registered_count(), 5);
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);
        registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();

        let result = registry.approve(&id("a1"), &id("a5"), &mut journal);
        assert!(matches!(result, Err(SuretyError::DuplicateVote { .. })));

        let result = registry.nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal);
        assert!(matches!(result, Err(SuretyError::DuplicateVote { .. })));

        assert_eq!(registry.get(&id("a5")).unwrap().approvers.len(), 1);
    }

    #[test]
    fn test_renomination_by_other_airline_counts_as_vote() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);
        registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();

        let admission = registry
            .nominate(&id("a4"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();
        assert_eq!(admission, Admission::Registered);
    }

    #[test]
    fn test_late_vote_is_noop() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);
        registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();
        registry.approve(&id("a2"), &id("a5"), &mut journal).unwrap();

        let before = journal.len();
        let admission = registry.approve(&id("a3"), &id("a5"), &mut journal).unwrap();
        assert_eq!(admission, Admission::Registered);
        assert_eq!(journal.len(), before);
        assert_eq!(registry.get(&id("a5")).unwrap().approvers.len(), 2);
    }

    #[test]
    fn test_nominating_registered_airline_fails() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(2, &mut journal);

        let result = registry.nominate(&id("a1"), &id("a2"), "Airline 2", &mut journal);
        assert_eq!(result, Err(SuretyError::AlreadyRegistered(id("a2"))));
    }

    #[test]
    fn test_pending_airline_cannot_vote() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);
        registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();
        registry
            .nominate(&id("a1"), &id("a6"), "Airline 6", &mut journal)
            .unwrap();

        let result = registry.approve(&id("a5"), &id("a6"), &mut journal);
        assert!(matches!(result, Err(SuretyError::Unauthorized { .. })));
    }

    #[test]
    fn test_fund_rules() {
        let mut journal = EventJournal::new();
        let mut registry =
            AirlineRegistry::new(id("a1"), "Airline 1", &SuretyParams::default(), &mut journal);

        let result = registry.fund(&id("a1"), dec!(9.99), &mut journal);
        assert!(matches!(result, Err(SuretyError::InsufficientFunds { .. })));
        assert!(!registry.get(&id("a1")).unwrap().funded);

        registry.fund(&id("a1"), dec!(10), &mut journal).unwrap();
        assert!(registry.can_participate(&id("a1")));

        let result = registry.fund(&id("a1"), dec!(10), &mut journal);
        assert_eq!(result, Err(SuretyError::AlreadyFunded(id("a1"))));
        assert_eq!(registry.total_funds(), Ok(dec!(10)));

        let result = registry.fund(&id("ghost"), dec!(10), &mut journal);
        assert_eq!(result, Err(SuretyError::AirlineNotFound(id("ghost"))));
    }

    #[test]
    fn test_summaries_list_registered_then_pending() {
        let mut journal = EventJournal::new();
        let mut registry = funded_registry(4, &mut journal);
        registry
            .nominate(&id("a1"), &id("a5"), "Airline 5", &mut journal)
            .unwrap();

        let summaries = registry.summaries();
        let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a4", "a5"]);
        assert!(!summaries[4].registered);
        assert_eq!(summaries[4].approvals, 1);
    }
}
