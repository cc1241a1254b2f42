//! State retained across deep-sleep power cycles.
//!
//! The original RTC-retained globals are modelled as one explicit struct
//! with a load/store boundary: the controller receives it at activation
//! start and flushes it before every suspension. It is the only
//! cross-activation shared resource and has exactly one writer — the
//! controller of the current activation.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::fsm::StateId;
use crate::power::WakeReason;

const RETAINED_NAMESPACE: &str = "sentry";
const RETAINED_KEY: &str = "retained";
const RETAINED_BLOB_MAX: usize = 128;

/// Everything that survives a power cycle between activations.
///
/// Counters only ever increase. `baseline_cm`, once set, is only replaced by
/// a newer valid reading — never cleared back to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedState {
    /// Machine state as a raw byte; decoded with a QuickCheck fallback so a
    /// corrupt value can never wedge the duty cycle.
    state_raw: u8,
    /// Reference distance for "no object present"; `None` until the first
    /// valid reading ever seen.
    pub baseline_cm: Option<f32>,
    /// Timestamp of the last candidate motion (ms, device-relative). 0 = never.
    pub last_motion_ms: u64,
    /// Timestamp of the last successful upload (ms). 0 = never.
    pub last_upload_ms: u64,
    /// Timestamp of the last baseline write (ms).
    pub last_baseline_update_ms: u64,
    /// Candidate motion episodes started.
    pub motion_event_count: u32,
    /// Successful uploads completed.
    pub total_uploads: u32,
    /// Activations, counted once per wake regardless of cause.
    pub boot_count: u32,
    /// Latched while a motion episode is being resolved.
    pub motion_active: bool,
}

impl Default for RetainedState {
    fn default() -> Self {
        Self {
            state_raw: StateId::QuickCheck as u8,
            baseline_cm: None,
            last_motion_ms: 0,
            last_upload_ms: 0,
            last_baseline_update_ms: 0,
            motion_event_count: 0,
            total_uploads: 0,
            boot_count: 0,
            motion_active: false,
        }
    }
}

impl RetainedState {
    /// Current machine state, decoded with the QuickCheck fallback.
    pub fn state(&self) -> StateId {
        StateId::from_persisted(self.state_raw)
    }

    pub fn set_state(&mut self, state: StateId) {
        self.state_raw = state as u8;
    }

    /// Book-keeping for the start of an activation.
    ///
    /// Increments `boot_count` exactly once. A wake that was not caused by
    /// the sleep timer restarts the duty cycle from the top: the machine
    /// state is forced to `QuickCheck` and any in-flight motion episode is
    /// abandoned. Counters and baseline are kept as loaded.
    pub fn note_boot(&mut self, wake: WakeReason) {
        self.boot_count = self.boot_count.wrapping_add(1);

        match wake {
            WakeReason::Timer => {
                // Timer wake always resumes the duty cycle at the top.
                self.set_state(StateId::QuickCheck);
            }
            _ => {
                self.set_state(StateId::QuickCheck);
                self.motion_active = false;
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Restore retained state from storage.
    ///
    /// A missing or corrupt blob yields cold-boot defaults; the duty cycle
    /// must never fail to start over persistence damage.
    pub fn load(storage: &impl StoragePort) -> Self {
        let mut buf = [0u8; RETAINED_BLOB_MAX];
        match storage.read(RETAINED_NAMESPACE, RETAINED_KEY, &mut buf) {
            Ok(len) => match postcard::from_bytes::<Self>(&buf[..len]) {
                Ok(state) => {
                    info!(
                        "Retained: restored (boot #{}, state={})",
                        state.boot_count,
                        state.state().name()
                    );
                    state
                }
                Err(_) => {
                    warn!("Retained: blob corrupt, cold start");
                    Self::default()
                }
            },
            Err(_) => {
                info!("Retained: no stored state, cold start");
                Self::default()
            }
        }
    }

    /// Flush retained state before suspension.
    ///
    /// A write failure is logged and swallowed: losing one activation's
    /// book-keeping is recoverable, halting the duty cycle is not.
    pub fn store(&self, storage: &mut impl StoragePort) {
        match postcard::to_allocvec(self) {
            Ok(bytes) => {
                if storage.write(RETAINED_NAMESPACE, RETAINED_KEY, &bytes).is_err() {
                    warn!("Retained: flush failed, state lost for this cycle");
                }
            }
            Err(_) => warn!("Retained: serialisation failed"),
        }
    }
}
