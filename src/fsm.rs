//! State machine vocabulary for the duty cycle.
//!
//! One activation runs handlers until a sleep decision falls out:
//!
//! ```text
//!  QUICK_CHECK ──[candidate motion]──▶ ACTIVE_MONITOR
//!      │                                    │
//!  [no motion / invalid /          [confirmed + rate limit ok]
//!   baseline init]                          ▼
//!      │                              UPLOAD_EVENT
//!      ▼                                    │
//!  DEEP_SLEEP ◀──[false alarm / rate-limited / upload done or failed]
//! ```
//!
//! `DeepSleep` is terminal for the activation: the machine only continues on
//! the next timer wake, which always resumes at `QuickCheck`. Handlers never
//! mutate a shared "current state" variable mid-function — each returns an
//! explicit [`Step`] and the controller applies it.

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all machine states.
///
/// The discriminant doubles as the persisted wire value, so new states must
/// only ever be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    QuickCheck = 0,
    ActiveMonitor = 1,
    UploadEvent = 2,
    DeepSleep = 3,
}

impl StateId {
    /// Decode a persisted state byte.
    ///
    /// Unrecognised or corrupt values resume the duty cycle at `QuickCheck`
    /// rather than failing the boot.
    pub fn from_persisted(raw: u8) -> Self {
        match raw {
            0 => Self::QuickCheck,
            1 => Self::ActiveMonitor,
            2 => Self::UploadEvent,
            3 => Self::DeepSleep,
            _ => Self::QuickCheck,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::QuickCheck => "QuickCheck",
            Self::ActiveMonitor => "ActiveMonitor",
            Self::UploadEvent => "UploadEvent",
            Self::DeepSleep => "DeepSleep",
        }
    }
}

// ---------------------------------------------------------------------------
// Handler outcome
// ---------------------------------------------------------------------------

/// Which sleep interval the controller should request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepKind {
    /// Normal duty-cycle interval.
    Normal,
    /// Reduced duty cycle during a quiet period.
    Extended,
}

/// Explicit result of one state handler: either hand off to another
/// in-process state, or end the activation with a sleep request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Transition to another state within this activation.
    Goto(StateId),
    /// Terminal for this activation: suspend for the given kind of interval.
    Sleep(SleepKind),
}

/// The resolved sleep decision handed back to the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    pub kind: SleepKind,
    pub duration_ms: u64,
}
