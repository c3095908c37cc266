//! Response tallies for a single status request
//!
//! A request is one (flight, index) bucket. Each oracle is counted at most
//! once per bucket regardless of which code it reports; the first code whose
//! tally reaches the threshold wins and the request never reopens.

use std::collections::{BTreeMap, HashSet};

use flightsurety_common::{AccountId, FlightKey, FlightStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a status request: `Open -> Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum RequestState {
    Open,
    Resolved(FlightStatus),
}

/// Effect of one response on a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// Counted; `matching` responses now share this status
    Counted {
        status: FlightStatus,
        matching: usize,
        required: usize,
    },
    /// This oracle already answered this request
    Duplicate,
    /// This response completed the quorum
    Reached(FlightStatus),
    /// The request had already resolved
    Closed,
}

/// Open or resolved status request for one (flight, index)
#[derive(Debug, Clone)]
pub struct StatusRequest {
    pub request_id: Uuid,
    pub flight: FlightKey,
    pub index: u8,
    /// Open time (Unix milliseconds)
    pub opened_at: i64,
    state: RequestState,
    responders: HashSet<AccountId>,
    tallies: BTreeMap<u8, Vec<AccountId>>,
}

impl StatusRequest {
    pub fn new(flight: FlightKey, index: u8) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            flight,
            index,
            opened_at: chrono::Utc::now().timestamp_millis(),
            state: RequestState::Open,
            responders: HashSet::new(),
            tallies: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    /// Responses currently counted for `status`
    pub fn tally(&self, status: FlightStatus) -> usize {
        self.tallies.get(&status.code()).map_or(0, Vec::len)
    }

    /// Effect a response would have, without counting it
    pub fn preview(&self, oracle: &AccountId, status: FlightStatus, threshold: usize) -> Vote {
        if !self.is_open() {
            return Vote::Closed;
        }
        if self.responders.contains(oracle) {
            return Vote::Duplicate;
        }

        let matching = self.tally(status) + 1;
        if matching >= threshold {
            Vote::Reached(status)
        } else {
            Vote::Counted {
                status,
                matching,
                required: threshold,
            }
        }
    }

    /// Count a response toward quorum
    pub fn record(&mut self, oracle: &AccountId, status: FlightStatus, threshold: usize) -> Vote {
        let vote = self.preview(oracle, status, threshold);
        if matches!(vote, Vote::Closed | Vote::Duplicate) {
            return vote;
        }

        self.responders.insert(oracle.clone());
        self.tallies
            .entry(status.code())
            .or_default()
            .push(oracle.clone());

        if let Vote::Reached(status) = vote {
            self.state = RequestState::Resolved(status);
            // minority codes no longer matter
            self.tallies.retain(|code, _| *code == status.code());
        }
        vote
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            request_id: self.request_id,
            index: self.index,
            state: self.state,
            responses: self
                .tallies
                .iter()
                .map(|(code, voters)| (*code, voters.len()))
                .collect(),
        }
    }
}

/// Read-only view of a request's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub request_id: Uuid,
    pub index: u8,
    pub state: RequestState,
    /// Response count per status code
    pub responses: BTreeMap<u8, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> StatusRequest {
        StatusRequest::new(FlightKey::new(AccountId::from("a1"), "ND1309", 100), 4)
    }

    fn oracle(n: u32) -> AccountId {
        AccountId::from(format!("oracle-{n}"))
    }

    #[test]
    fn test_resolves_at_threshold() {
        let mut req = request();
        assert!(matches!(
            req.record(&oracle(1), FlightStatus::LateAirline, 3),
            Vote::Counted { matching: 1, .. }
        ));
        req.record(&oracle(2), FlightStatus::LateAirline, 3);
        assert_eq!(
            req.record(&oracle(3), FlightStatus::LateAirline, 3),
            Vote::Reached(FlightStatus::LateAirline)
        );
        assert_eq!(req.state(), RequestState::Resolved(FlightStatus::LateAirline));
    }

    #[test]
    fn test_same_oracle_counted_once() {
        let mut req = request();
        req.record(&oracle(1), FlightStatus::OnTime, 3);
        assert_eq!(req.record(&oracle(1), FlightStatus::OnTime, 3), Vote::Duplicate);
        assert_eq!(req.record(&oracle(1), FlightStatus::LateOther, 3), Vote::Duplicate);
        assert_eq!(req.tally(FlightStatus::OnTime), 1);
        assert_eq!(req.tally(FlightStatus::LateOther), 0);
    }

    #[test]
    fn test_first_code_to_threshold_wins() {
        let mut req = request();
        req.record(&oracle(1), FlightStatus::OnTime, 2);
        req.record(&oracle(2), FlightStatus::LateWeather, 2);
        assert_eq!(
            req.record(&oracle(3), FlightStatus::LateWeather, 2),
            Vote::Reached(FlightStatus::LateWeather)
        );

        // minority discarded, later responses have no effect
        assert_eq!(req.tally(FlightStatus::OnTime), 0);
        assert_eq!(req.record(&oracle(4), FlightStatus::OnTime, 2), Vote::Closed);
        assert_eq!(req.record(&oracle(5), FlightStatus::OnTime, 2), Vote::Closed);
        assert_eq!(req.state(), RequestState::Resolved(FlightStatus::LateWeather));
    }

    #[test]
    fn test_preview_does_not_count() {
        let mut req = request();
        req.record(&oracle(1), FlightStatus::LateAirline, 2);

        assert_eq!(
            req.preview(&oracle(2), FlightStatus::LateAirline, 2),
            Vote::Reached(FlightStatus::LateAirline)
        );
        assert_eq!(req.preview(&oracle(1), FlightStatus::LateAirline, 2), Vote::Duplicate);
        assert_eq!(req.tally(FlightStatus::LateAirline), 1);
        assert_eq!(req.state(), RequestState::Open);

        assert_eq!(
            req.record(&oracle(2), FlightStatus::LateAirline, 2),
            Vote::Reached(FlightStatus::LateAirline)
        );
        assert_eq!(req.preview(&oracle(3), FlightStatus::OnTime, 2), Vote::Closed);
    }

    #[test]
    fn test_summary_counts_by_code() {
        let mut req = request();
        req.record(&oracle(1), FlightStatus::OnTime, 3);
        req.record(&oracle(2), FlightStatus::LateAirline, 3);
        req.record(&oracle(3), FlightStatus::LateAirline, 3);

        let summary = req.summary();
        assert_eq!(summary.state, RequestState::Open);
        assert_eq!(summary.responses.get(&10), Some(&1));
        assert_eq!(summary.responses.get(&20), Some(&2));
    }
}
