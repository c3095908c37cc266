//! Shared handle serializing every call through one lock
//!
//! Each command runs to completion under the lock, so concurrent callers
//! observe a one-at-a-time execution of the engine. The lock is never held
//! across an `.await`.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::FlightSurety;

/// Cloneable, thread-safe handle to a [`FlightSurety`] engine
#[derive(Debug, Clone)]
pub struct SharedSurety {
    inner: Arc<Mutex<FlightSurety>>,
}

impl SharedSurety {
    pub fn new(engine: FlightSurety) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut FlightSurety) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    pub fn lock(&self) -> MutexGuard<'_, FlightSurety> {
        self.inner.lock()
    }
}

impl From<FlightSurety> for SharedSurety {
    fn from(engine: FlightSurety) -> Self {
        Self::new(engine)
    }
}
