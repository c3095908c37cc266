//! Insurance - policies, passenger balances and payouts
//!
//! - [`policy`]: a single escrowed policy and its settlement
//! - [`ledger`]: all policies, passenger balances and fund accounting

pub mod ledger;
pub mod policy;

pub use ledger::{Accounting, InsuranceLedger};
pub use policy::{InsurancePolicy, PolicyState};
