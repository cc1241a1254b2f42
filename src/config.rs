//! System configuration parameters
//!
//! All tunable parameters for the MotionSentry duty cycle.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sleep durations ---
    /// Deep sleep between activations while monitoring normally (ms)
    pub deep_sleep_normal_ms: u64,
    /// Deep sleep during a quiet period (ms)
    pub deep_sleep_extended_ms: u64,
    /// No motion for this long = quiet period (ms)
    pub quiet_period_threshold_ms: u64,

    // --- Active monitoring ---
    /// Total active monitoring window (ms)
    pub active_monitor_duration_ms: u64,
    /// Poll cadence inside the monitoring window (ms)
    pub active_monitor_interval_ms: u32,

    // --- Motion detection ---
    /// Distance change vs baseline that counts as candidate motion (cm)
    pub motion_threshold_cm: f32,
    /// Consecutive readings within this tolerance count as stable (cm)
    pub motion_stability_tolerance_cm: f32,
    /// Sustained stability required to confirm motion (ms)
    pub motion_confirm_time_ms: u64,
    /// Baseline refresh interval while the scene is quiescent (ms)
    pub baseline_update_interval_ms: u64,

    // --- Upload control ---
    /// Minimum spacing between successive uploads (ms)
    pub min_upload_interval_ms: u64,
    /// WiFi connection timeout (ms)
    pub wifi_connect_timeout_ms: u32,
    /// Telemetry session readiness / publish-flush timeout (ms)
    pub upload_timeout_ms: u32,

    // --- Sensor plausibility ---
    /// Echo wait cap (µs); no echo within this window = no reading
    pub echo_timeout_us: u32,
    /// Shortest plausible distance (cm)
    pub sensor_min_cm: f32,
    /// Longest plausible distance (cm)
    pub sensor_max_cm: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sleep durations
            deep_sleep_normal_ms: 10_000,    // 10 seconds - normal monitoring
            deep_sleep_extended_ms: 30_000,  // 30 seconds - quiet period
            quiet_period_threshold_ms: 300_000, // 5 minutes of no motion

            // Active monitoring
            active_monitor_duration_ms: 30_000, // 30 second window
            active_monitor_interval_ms: 2_000,  // 2 second cadence

            // Motion detection
            motion_threshold_cm: 10.0,
            motion_stability_tolerance_cm: 5.0,
            motion_confirm_time_ms: 2_000,
            baseline_update_interval_ms: 300_000, // 5 minutes

            // Upload control
            min_upload_interval_ms: 60_000, // 60 seconds between uploads
            wifi_connect_timeout_ms: 5_000,
            upload_timeout_ms: 3_000,

            // Sensor plausibility (HC-SR04 datasheet envelope)
            echo_timeout_us: 30_000,
            sensor_min_cm: 2.0,
            sensor_max_cm: 400.0,
        }
    }
}
