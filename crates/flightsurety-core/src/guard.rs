//! Process-wide operational switch

use flightsurety_common::{AccountId, EventJournal, Result, SuretyError, SuretyEvent};
use tracing::{info, warn};

/// Enabled/disabled switch checked by every mutating command
#[derive(Debug)]
pub struct OperationalGuard {
    admin: AccountId,
    operational: bool,
}

impl OperationalGuard {
    /// Create an enabled guard controlled by `admin`
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            operational: true,
        }
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn ensure_operational(&self) -> Result<()> {
        if self.operational {
            Ok(())
        } else {
            Err(SuretyError::OperationalDisabled)
        }
    }

    /// Flip the switch; only the administrator may do so, even while disabled.
    pub fn set_operational(
        &mut self,
        caller: &AccountId,
        operational: bool,
        journal: &mut EventJournal,
    ) -> Result<()> {
        if caller != &self.admin {
            warn!(caller = %caller, "Rejected operational status change from non-admin");
            return Err(SuretyError::Unauthorized {
                caller: caller.clone(),
            });
        }

        if self.operational != operational {
            self.operational = operational;
            journal.record(SuretyEvent::OperationalStatusChanged { operational });
            info!(operational, "Operational status changed");
        }
        Ok(())
    }
}
