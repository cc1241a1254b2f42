//! Two-stage motion detection.
//!
//! Stage one is a single-sample threshold test against the baseline —
//! cheap, but noise-prone (sensor jitter, transient reflections). Stage two
//! runs during the active-monitoring window: a candidate is promoted to
//! *confirmed* only when consecutive readings stay within a small stability
//! tolerance of each other for a sustained duration. One destabilising
//! sample resets the sustained timer to zero; there is no partial credit.

// ---------------------------------------------------------------------------
// Candidate detection
// ---------------------------------------------------------------------------

/// Single-sample threshold comparison against the baseline.
#[derive(Debug, Clone, Copy)]
pub struct MotionDetector {
    threshold_cm: f32,
}

impl MotionDetector {
    pub fn new(threshold_cm: f32) -> Self {
        Self { threshold_cm }
    }

    /// Candidate motion: the live reading deviates from the baseline by more
    /// than the threshold. Requires both the baseline and the reading to be
    /// present; otherwise there is no motion by definition.
    pub fn candidate(&self, baseline_cm: Option<f32>, current_cm: Option<f32>) -> bool {
        match (baseline_cm, current_cm) {
            (Some(baseline), Some(current)) => (current - baseline).abs() > self.threshold_cm,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Confirmation debounce
// ---------------------------------------------------------------------------

/// Stability debounce over the active-monitoring window.
///
/// Built fresh for each window. Feed it every *valid* sample via
/// [`observe`](Self::observe); invalid readings are skipped by the caller
/// and leave the filter untouched. Confirmation is a monotone latch: once
/// set it holds for the remainder of the window.
#[derive(Debug)]
pub struct ConfirmFilter {
    tolerance_cm: f32,
    confirm_time_ms: u64,
    last_cm: Option<f32>,
    stable_since_ms: Option<u64>,
    confirmed: bool,
}

impl ConfirmFilter {
    pub fn new(tolerance_cm: f32, confirm_time_ms: u64) -> Self {
        Self {
            tolerance_cm,
            confirm_time_ms,
            last_cm: None,
            stable_since_ms: None,
            confirmed: false,
        }
    }

    /// Process one valid sample and return the confirmation latch.
    ///
    /// The sustained-stability timer starts at the second sample of a stable
    /// pair and is zeroed by any sample that breaks the tolerance or is not
    /// a candidate.
    pub fn observe(&mut self, now_ms: u64, distance_cm: f32, candidate: bool) -> bool {
        if candidate {
            match self.last_cm {
                Some(prev) if (distance_cm - prev).abs() < self.tolerance_cm => {
                    let since = *self.stable_since_ms.get_or_insert(now_ms);
                    if now_ms.saturating_sub(since) >= self.confirm_time_ms {
                        self.confirmed = true;
                    }
                }
                _ => self.stable_since_ms = None,
            }
        } else {
            self.stable_since_ms = None;
        }

        self.last_cm = Some(distance_cm);
        self.confirmed
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}
