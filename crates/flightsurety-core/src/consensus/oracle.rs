//! Oracle agents and the index arena
//!
//! The index space is small and bounded, so membership is kept as one bucket
//! per index rather than a sparse map.

use std::collections::{BTreeSet, HashMap};

use flightsurety_common::{AccountId, Amount, Result, SuretyError};
use serde::{Deserialize, Serialize};

/// Registered oracle with its assigned indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleAgent {
    pub id: AccountId,
    /// Distinct indexes, ascending
    pub indexes: Vec<u8>,
    pub fee_paid: Amount,
    /// Registration time (Unix milliseconds)
    pub registered_at: i64,
}

impl OracleAgent {
    #[inline]
    pub fn holds(&self, index: u8) -> bool {
        self.indexes.binary_search(&index).is_ok()
    }
}

/// Oracle membership, by identity and by index
#[derive(Debug)]
pub struct OracleRoster {
    agents: HashMap<AccountId, OracleAgent>,
    buckets: Vec<BTreeSet<AccountId>>,
    fees_collected: Amount,
}

impl OracleRoster {
    pub fn new(index_space: u8) -> Self {
        Self {
            agents: HashMap::new(),
            buckets: vec![BTreeSet::new(); index_space as usize],
            fees_collected: Amount::ZERO,
        }
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn get(&self, id: &AccountId) -> Option<&OracleAgent> {
        self.agents.get(id)
    }

    /// Oracles holding `index`; `None` outside the index space
    pub fn bucket(&self, index: u8) -> Option<&BTreeSet<AccountId>> {
        self.buckets.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn fees_collected(&self) -> Amount {
        self.fees_collected
    }

    /// Add an agent; the caller has already checked it is new and drawn its indexes
    pub(crate) fn insert(&mut self, mut agent: OracleAgent) -> Result<()> {
        let fees_collected = self
            .fees_collected
            .checked_add(agent.fee_paid)
            .ok_or(SuretyError::AmountOverflow("oracle fees"))?;

        agent.indexes.sort_unstable();
        agent.indexes.dedup();
        for &index in &agent.indexes {
            if let Some(bucket) = self.buckets.get_mut(index as usize) {
                bucket.insert(agent.id.clone());
            }
        }
        self.fees_collected = fees_collected;
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }
}
