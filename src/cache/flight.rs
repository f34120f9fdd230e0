//! Single-Flight Module
//!
//! Coalesces concurrent recomputations of the same cache key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// == Single Flight ==
/// Per-key gates. Holding a gate means "I am computing this key".
///
/// Gates for different keys are independent, so a slow recomputation only
/// delays callers waiting on the same key.
#[derive(Debug, Default)]
pub struct SingleFlight {
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Waits until no other caller holds the gate for `key`, then takes it.
    pub async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let gate = self.gates().entry(key.to_string()).or_default().clone();
        let guard = gate.clone().lock_owned().await;

        FlightGuard {
            owner: self,
            key: key.to_string(),
            gate,
            guard: Some(guard),
        }
    }

    /// Number of keys with a registered gate.
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.gates().len()
    }

    fn gates(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.gates.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// == Flight Guard ==
/// Releases the gate on drop and forgets it once nobody else is waiting.
pub struct FlightGuard<'a> {
    owner: &'a SingleFlight,
    key: String,
    gate: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut gates = self.owner.gates();
        let idle = gates
            .get(&self.key)
            .map(|current| Arc::ptr_eq(current, &self.gate) && Arc::strong_count(&self.gate) <= 2)
            .unwrap_or(false);
        if idle {
            gates.remove(&self.key);
        }
    }
}
