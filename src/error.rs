//! Unified error types for the MotionSentry firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be cheaply threaded through state handlers without
//! allocation. Every variant is recoverable: the duty cycle absorbs the
//! failure, logs it, and retries on the next activation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The distance sensor could not produce a usable reading.
    Sensor(SensorError),
    /// An upload attempt failed or was rejected.
    Upload(UploadError),
    /// Persistent storage failed.
    Storage(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Upload(e) => write!(f, "upload: {e}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No echo arrived within the pulse timeout.
    EchoTimeout,
    /// Converted distance is outside the physically plausible range.
    OutOfRange,
    /// GPIO read or write returned an error.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoTimeout => write!(f, "echo timeout"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Upload errors
// ---------------------------------------------------------------------------

/// Classified outcomes of a failed upload attempt.
///
/// `RateLimited` is a policy decision, not a fault: the gatekeeper rejected
/// the attempt before any I/O because the minimum inter-upload interval has
/// not elapsed. The other variants are genuine transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// Minimum inter-upload interval has not elapsed; no I/O was performed.
    RateLimited,
    /// Network connectivity could not be established within the timeout.
    ConnectivityFailed,
    /// The telemetry session did not become ready within the timeout.
    TelemetryNotReady,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::ConnectivityFailed => write!(f, "connectivity failed"),
            Self::TelemetryNotReady => write!(f, "telemetry session not ready"),
        }
    }
}

impl From<UploadError> for Error {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
