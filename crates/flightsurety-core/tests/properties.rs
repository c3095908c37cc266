//! Property-based tests for airline admission, quorum resolution and fund accounting

use std::collections::{BTreeMap, HashMap, HashSet};

use flightsurety_common::{AccountId, Amount, FlightKey, FlightStatus, SuretyError, SuretyParams};
use flightsurety_core::consensus::{StatusRequest, Vote};
use flightsurety_core::{Admission, FlightSurety, RequestState};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const THRESHOLD: usize = 3;

fn status_strategy() -> impl Strategy<Value = FlightStatus> {
    prop::sample::select(FlightStatus::ALL.to_vec())
}

/// (oracle number, reported status) pairs, oracles drawn from a small pool so
/// duplicates are common
fn responses_strategy() -> impl Strategy<Value = Vec<(u8, FlightStatus)>> {
    prop::collection::vec((0u8..8, status_strategy()), 0..24)
}

/// Premium in whole cents between 0.01 and 1.00
fn premium_strategy() -> impl Strategy<Value = Amount> {
    (1i64..=100).prop_map(|cents| Decimal::new(cents, 2))
}

fn flight_surety() -> FlightSurety {
    // one index so every oracle answers every request
    let params = SuretyParams {
        index_space: 1,
        indexes_per_oracle: 1,
        ..Default::default()
    };
    let airline = AccountId::from("a1");
    let mut surety = FlightSurety::new(AccountId::from("owner"), airline.clone(), "Airline 1", params)
        .unwrap()
        .with_rng_seed(0);
    surety.fund_airline(&airline, dec!(10)).unwrap();
    for n in 0..THRESHOLD + 2 {
        surety
            .register_oracle(&AccountId::from(format!("oracle-{n}")), dec!(1))
            .unwrap();
    }
    surety
}

/// Engine with `registered` funded airlines a1..=a{registered}
fn airlines_surety(registered: usize) -> FlightSurety {
    let first = AccountId::from("a1");
    let mut surety =
        FlightSurety::new(AccountId::from("owner"), first.clone(), "Airline 1", SuretyParams::default())
            .unwrap();
    surety.fund_airline(&first, dec!(10)).unwrap();
    for n in 2..=registered {
        let airline = AccountId::from(format!("a{n}"));
        let mut admission = surety.nominate_airline(&first, &airline, "Airline").unwrap();
        for voter in 2..n {
            if admission == Admission::Registered {
                break;
            }
            admission = surety
                .approve_airline(&AccountId::from(format!("a{voter}")), &airline)
                .unwrap();
        }
        surety.fund_airline(&airline, dec!(10)).unwrap();
    }
    surety
}

fn resolve(surety: &mut FlightSurety, flight: &FlightKey, status: FlightStatus) {
    let index = surety.request_status(flight).unwrap();
    for oracle in surety.oracles_for_index(index).into_iter().take(THRESHOLD) {
        surety
            .submit_response(&oracle, index, flight, status.code())
            .unwrap();
    }
}

proptest! {
    /// Property: past the bootstrap phase a nominee is registered exactly
    /// when its distinct approvers reach half the registered airlines
    #[test]
    fn prop_admission_needs_half_the_votes(
        registered in 4usize..9,
        votes in prop::collection::vec(1usize..9, 0..12),
    ) {
        let mut surety = airlines_surety(registered);
        let nominee = AccountId::from("nominee");
        let required = registered.div_ceil(2);

        let first = surety.nominate_airline(&AccountId::from("a1"), &nominee, "Nominee").unwrap();
        let mut approvers: HashSet<usize> = HashSet::from([1]);
        prop_assert_eq!(first, Admission::Pending { approvals: 1, required });

        for voter in votes.into_iter().filter(|v| *v <= registered) {
            let was_registered = approvers.len() >= required;
            let result = surety.approve_airline(&AccountId::from(format!("a{voter}")), &nominee);

            if was_registered {
                prop_assert_eq!(result, Ok(Admission::Registered));
            } else if !approvers.insert(voter) {
                let is_duplicate = matches!(result, Err(SuretyError::DuplicateVote { .. }));
                prop_assert!(is_duplicate);
            } else if approvers.len() >= required {
                prop_assert_eq!(result, Ok(Admission::Registered));
            } else {
                prop_assert_eq!(
                    result,
                    Ok(Admission::Pending { approvals: approvers.len(), required })
                );
            }
            prop_assert_eq!(
                surety.airlines().is_registered(&nominee),
                approvers.len() >= required
            );
        }
    }

    /// Property: a request resolves exactly when some status collects
    /// `THRESHOLD` distinct oracles, and it resolves to the first such status.
    #[test]
    fn prop_quorum_resolves_on_first_threshold(responses in responses_strategy()) {
        let flight = FlightKey::new(AccountId::from("a1"), "ND1309", 0);
        let mut request = StatusRequest::new(flight, 0);

        let mut seen = HashSet::new();
        let mut counts: HashMap<FlightStatus, usize> = HashMap::new();
        let mut expected: Option<FlightStatus> = None;

        for (n, status) in responses {
            let oracle = AccountId::from(format!("oracle-{n}"));
            let vote = request.record(&oracle, status, THRESHOLD);

            if expected.is_some() {
                prop_assert_eq!(vote, Vote::Closed);
                continue;
            }
            if !seen.insert(n) {
                prop_assert_eq!(vote, Vote::Duplicate);
                continue;
            }

            let count = counts.entry(status).or_default();
            *count += 1;
            if *count >= THRESHOLD {
                expected = Some(status);
                prop_assert_eq!(vote, Vote::Reached(status));
            } else {
                let is_counted = matches!(vote, Vote::Counted { matching, .. } if matching == *count);
                prop_assert!(is_counted);
            }
        }

        match expected {
            Some(status) => prop_assert_eq!(request.state(), RequestState::Resolved(status)),
            None => prop_assert_eq!(request.state(), RequestState::Open),
        }
    }

    /// Property: no oracle is ever counted twice in one request
    #[test]
    fn prop_tallies_never_exceed_distinct_oracles(responses in responses_strategy()) {
        let flight = FlightKey::new(AccountId::from("a1"), "ND1309", 0);
        let mut request = StatusRequest::new(flight, 0);
        let mut distinct = HashSet::new();

        for (n, status) in responses {
            request.record(&AccountId::from(format!("oracle-{n}")), status, THRESHOLD);
            distinct.insert(n);
        }

        let counted: usize = request.summary().responses.values().sum();
        prop_assert!(counted <= distinct.len());
    }

    /// Property: premiums and payouts balance after any mix of purchases,
    /// resolutions, repeated resolutions and withdrawals
    #[test]
    fn prop_funds_conserved(
        purchases in prop::collection::vec((0usize..3, 0u8..6, premium_strategy()), 1..20),
        outcomes in prop::collection::vec(status_strategy(), 3),
        withdrawers in prop::collection::vec(0u8..6, 0..6),
    ) {
        let mut surety = flight_surety();
        let airline = AccountId::from("a1");
        let flights: Vec<FlightKey> = (0..3)
            .map(|n| surety.register_flight(&airline, &format!("ND{n}"), 1_700_000_000).unwrap())
            .collect();

        // expected balance per passenger from accepted purchases
        let mut insured: BTreeMap<(usize, u8), Amount> = BTreeMap::new();
        for (flight, passenger, premium) in purchases {
            let buyer = AccountId::from(format!("passenger-{passenger}"));
            match surety.buy(&buyer, &flights[flight], premium) {
                Ok(_) => {
                    insured.insert((flight, passenger), premium);
                }
                Err(err) => {
                    let is_already_insured = matches!(err, SuretyError::AlreadyInsured { .. });
                    prop_assert!(is_already_insured);
                }
            }
        }

        for (flight, status) in flights.iter().zip(&outcomes) {
            resolve(&mut surety, flight, *status);
        }

        // late reports bounce off the resolved request and change nothing
        let before = surety.accounting().clone();
        for flight in &flights {
            let index = surety.request_status(flight).unwrap();
            let extra = surety.oracles_for_index(index).pop().unwrap();
            let late = surety.submit_response(&extra, index, flight, FlightStatus::LateAirline.code());
            prop_assert!(late.unwrap_err().is_ignorable());
        }
        prop_assert_eq!(&before, surety.accounting());

        let mut expected: HashMap<u8, Amount> = HashMap::new();
        for ((flight, passenger), premium) in &insured {
            if outcomes[*flight].is_payable() {
                *expected.entry(*passenger).or_default() += *premium * dec!(1.5);
            }
        }
        for passenger in 0u8..6 {
            let id = AccountId::from(format!("passenger-{passenger}"));
            let want = expected.get(&passenger).copied().unwrap_or_default();
            prop_assert_eq!(surety.get_passenger_balance(&id), want);
        }

        for passenger in withdrawers {
            let _ = surety.withdraw(&AccountId::from(format!("passenger-{passenger}")));
        }

        let accounting = surety.accounting();
        let balances: Amount = (0u8..6)
            .map(|p| surety.get_passenger_balance(&AccountId::from(format!("passenger-{p}"))))
            .sum();
        prop_assert!(accounting.premiums_conserved());
        prop_assert_eq!(accounting.escrowed, Decimal::ZERO);
        prop_assert_eq!(accounting.credited, accounting.withdrawn + balances);
    }
}
