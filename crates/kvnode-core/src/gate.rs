//! §4.4: the process-wide "syncer-only" admission gate. While set, every
//! write fails fast with `SYNCER_ONLY` before anything is proposed; reads
//! are never affected.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

/// An atomic pair: the gate itself, and the monotonic time of its last
/// true→false transition, so other subsystems can tell "recently
/// reopened" apart from "has been open all along" (§9 design notes).
pub struct AdmissionGate {
    syncer_only: AtomicBool,
    last_disable_nanos: AtomicI64,
    epoch: Instant,
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AdmissionGate {
    pub fn new(syncer_only: bool) -> Self {
        Self {
            syncer_only: AtomicBool::new(syncer_only),
            last_disable_nanos: AtomicI64::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn get(&self) -> bool {
        self.syncer_only.load(Ordering::Acquire)
    }

    /// Sets the gate. A true→false transition records the current
    /// monotonic time (relative to this gate's construction).
    pub fn set(&self, syncer_only: bool) {
        let was_set = self.syncer_only.swap(syncer_only, Ordering::AcqRel);
        if was_set && !syncer_only {
            let nanos = self.epoch.elapsed().as_nanos() as i64;
            self.last_disable_nanos.store(nanos, Ordering::Release);
        }
    }

    /// Monotonic nanoseconds (relative to this gate's construction) of
    /// the last true→false transition, or `0` if none has occurred.
    pub fn last_disabled_at(&self) -> i64 {
        self.last_disable_nanos.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_open() {
        let gate = AdmissionGate::default();
        assert!(!gate.get());
        assert_eq!(gate.last_disabled_at(), 0);
    }

    #[test]
    fn records_timestamp_only_on_true_to_false_transition() {
        let gate = AdmissionGate::new(true);
        assert_eq!(gate.last_disabled_at(), 0);

        gate.set(false);
        let first = gate.last_disabled_at();
        assert!(first > 0);

        gate.set(true);
        assert_eq!(gate.last_disabled_at(), first);

        gate.set(true);
        assert_eq!(gate.last_disabled_at(), first);
    }
}
