//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them — log to serial, record in a test, etc.
//! Event emission is observability, not contract: the duty cycle is correct
//! with a sink that drops everything.

use crate::error::UploadError;
use crate::fsm::{SleepKind, StateId};
use crate::power::WakeReason;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A new activation began (after wake-cause book-keeping).
    ActivationStarted { boot_count: u32, wake: WakeReason },

    /// The machine moved between in-process states.
    StateChanged { from: StateId, to: StateId },

    /// The sensor produced no usable reading this cycle.
    SensorUnavailable,

    /// First-ever baseline written.
    BaselineInitialised { distance_cm: f32 },

    /// Periodic quiescent-scene baseline refresh.
    BaselineRefreshed { distance_cm: f32 },

    /// Single-sample threshold crossing — a motion episode begins.
    MotionCandidate { distance_cm: f32, baseline_cm: f32 },

    /// The debounce promoted the candidate to confirmed.
    MotionConfirmed { distance_cm: f32 },

    /// The monitoring window ended without confirmation.
    FalseAlarm,

    /// Confirmed motion, but the rate limit blocked the upload.
    UploadSkipped,

    /// Upload transaction finished; carries the published record.
    UploadCompleted(MotionReport),

    /// Upload transaction failed (classified).
    UploadFailed(UploadError),

    /// Activation ends: the device is about to suspend.
    EnteringSleep { kind: SleepKind, duration_ms: u64 },
}

/// The record published for one confirmed motion event, plus the rolling
/// aggregates written alongside it.
#[derive(Debug, Clone)]
pub struct MotionReport {
    /// Index of this event in the remote event log (pre-increment).
    pub event_index: u32,
    /// Final distance reading at upload time; `None` if the sensor failed.
    pub distance_cm: Option<f32>,
    /// Device-relative timestamp of the upload (ms).
    pub timestamp_ms: u64,
    pub boot_count: u32,
    pub motion_event_count: u32,
    /// Aggregate as it will read after this upload lands.
    pub total_uploads: u32,
}
