//! Running volume budget
//!
//! Tracks the lamports already moved in the current session against an
//! optional cap. The planner works on a copy; the store persists the
//! session and grows it only from confirmed transfers.

use serde::{Deserialize, Serialize};

/// Running total of session volume with an optional ceiling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAccumulator {
    /// Lamports already counted
    #[serde(default)]
    used: u64,

    /// Optional ceiling in lamports
    #[serde(default)]
    cap: Option<u64>,
}

impl VolumeAccumulator {
    pub fn new(cap: Option<u64>, used: u64) -> Self {
        Self { used, cap }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn cap(&self) -> Option<u64> {
        self.cap
    }

    pub fn set_cap(&mut self, cap: Option<u64>) {
        self.cap = cap;
    }

    /// Start a new session (cap is kept)
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Check if adding `lamports` would go over the cap
    pub fn would_exceed(&self, lamports: u64) -> bool {
        match self.cap {
            Some(cap) => self.used.saturating_add(lamports) > cap,
            None => false,
        }
    }

    /// Add `lamports` if it fits under the cap
    pub fn try_add(&mut self, lamports: u64) -> bool {
        if self.would_exceed(lamports) {
            return false;
        }
        self.used = self.used.saturating_add(lamports);
        true
    }

    /// Add confirmed volume unconditionally
    pub fn record(&mut self, lamports: u64) {
        self.used = self.used.saturating_add(lamports);
    }

    /// Lamports left under the cap (None when uncapped)
    pub fn remaining(&self) -> Option<u64> {
        self.cap.map(|cap| cap.saturating_sub(self.used))
    }

    /// Cap utilization in percent (None when uncapped)
    pub fn utilization_pct(&self) -> Option<f64> {
        self.cap.map(|cap| {
            if cap == 0 {
                100.0
            } else {
                (self.used as f64 / cap as f64) * 100.0
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncapped_never_exceeds() {
        let mut acc = VolumeAccumulator::new(None, u64::MAX - 1);
        assert!(!acc.would_exceed(10));
        assert!(acc.try_add(10));
        assert_eq!(acc.used(), u64::MAX);
        assert_eq!(acc.remaining(), None);
    }

    #[test]
    fn test_cap_boundary_is_inclusive() {
        let mut acc = VolumeAccumulator::new(Some(3), 0);
        assert!(acc.try_add(1));
        assert!(acc.try_add(2));
        assert!(!acc.try_add(1));
        assert_eq!(acc.used(), 3);
        assert_eq!(acc.remaining(), Some(0));
    }

    #[test]
    fn test_reset_keeps_cap() {
        let mut acc = VolumeAccumulator::new(Some(100), 80);
        assert_eq!(acc.utilization_pct(), Some(80.0));
        acc.reset();
        assert_eq!(acc.used(), 0);
        assert_eq!(acc.cap(), Some(100));
    }

    #[test]
    fn test_record_ignores_cap() {
        let mut acc = VolumeAccumulator::new(Some(5), 4);
        acc.record(10);
        assert_eq!(acc.used(), 14);
        assert_eq!(acc.remaining(), Some(0));
    }
}
