//! Re-entrancy guard for update propagation.

/// Number of updates one trigger may propagate.
const UPDATE_THRESHOLD: u32 = 1;

/// Limits how many updates a single trigger may push to the other store.
///
/// Writing a cross-reference back onto a record is itself a save, which the
/// surrounding system reports as another update trigger. Threading one guard
/// through every call made on behalf of the first trigger stops that save
/// from bouncing between the two stores.
///
/// This is a counter, not a lock. It says nothing about independent triggers
/// running at the same time.
#[derive(Debug, Default)]
pub struct SyncGuard {
    updates: u32,
}

impl SyncGuard {
    pub fn new() -> Self {
        SyncGuard::default()
    }

    /// Claim the right to perform an update. Returns `false` once the
    /// threshold has been reached.
    pub fn try_consume(&mut self) -> bool {
        if self.updates >= UPDATE_THRESHOLD {
            return false;
        }
        self.updates += 1;
        true
    }

    pub fn is_spent(&self) -> bool {
        self.updates >= UPDATE_THRESHOLD
    }
}
