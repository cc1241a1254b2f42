//! Port traits — the boundary between the decision core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor, connectivity, telemetry, clock, storage, event
//! sinks) implement these traits. The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and the whole duty cycle runs under test with mock adapters.

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Distance sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the ranging sensor.
pub trait DistanceSensorPort {
    /// One measurement attempt: a validated distance in centimetres, or
    /// `None` when the echo timed out or fell outside the plausible range.
    /// Must not block beyond the sensor's own echo timeout. No retries —
    /// the caller decides what repeated failures mean.
    fn measure_distance(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (domain → network radio)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// The link did not come up within the caller's timeout.
    Timeout,
    /// No credentials are configured.
    NoCredentials,
}

impl core::fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "connect timed out"),
            Self::NoCredentials => write!(f, "no credentials configured"),
        }
    }
}

/// Network link lifecycle. `disconnect` must be idempotent: calling it when
/// no connection exists is a no-op, never an error.
pub trait ConnectivityPort {
    fn connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (domain → cloud key/value sink)
// ───────────────────────────────────────────────────────────────

/// Scalar values accepted by the telemetry sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryValue {
    Float(f32),
    Uint(u32),
    Timestamp(u64),
    Flag(bool),
}

/// Remote key/value telemetry session.
///
/// `publish` is fire-and-forget per field; `flush` is the single bounded
/// wait for outstanding writes. Partial publication on timeout is possible
/// and callers must treat the record as best-effort, not atomic.
pub trait TelemetryPort {
    /// Block until the session is usable, up to `timeout_ms`.
    fn await_ready(&mut self, timeout_ms: u32) -> bool;

    /// Queue one scalar write under a hierarchical key.
    fn publish(&mut self, path: &str, value: TelemetryValue);

    /// Wait up to `timeout_ms` for queued writes to drain. Returns `false`
    /// on timeout; already-queued fields may still land later or never.
    fn flush(&mut self, timeout_ms: u32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port (injected time source + bounded delay)
// ───────────────────────────────────────────────────────────────

/// Monotonic device-relative time. On hardware the value keeps advancing
/// across deep sleep; in tests it is advanced by hand so the monitoring
/// window runs without real waiting.
pub trait ClockPort {
    fn now_ms(&self) -> u64;

    /// Bounded blocking delay — the monitoring-window cadence.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / observers)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, test
/// recorder, …).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting. Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not silently
/// clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for retained state, config, and crash notes.
///
/// Keys are namespaced to prevent collisions between subsystems. Writes are
/// atomic per key — no partial blobs on power loss (the ESP-IDF NVS API
/// guarantees this natively; the in-memory simulation trivially).
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
