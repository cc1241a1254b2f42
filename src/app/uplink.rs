//! Upload gatekeeper — owns the network + telemetry transaction.
//!
//! One successful pass costs a WiFi association, a session handshake, and a
//! handful of key/value writes, so the gatekeeper is the only component
//! allowed to spend that power. It enforces the minimum inter-upload
//! interval *before* any I/O, bounds every blocking step with a timeout,
//! and tears the link down on every exit path. Failures never escape this
//! boundary unclassified.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::UploadError;

use super::events::MotionReport;
use super::ports::{ConnectivityPort, TelemetryPort, TelemetryValue};

/// Remote key prefix for the event log and rolling aggregates.
const EVENT_ROOT: &str = "/motion_detection/events";
const STATS_ROOT: &str = "/motion_detection/stats";

/// Wire sentinel for "no final reading" — the sink stores scalars only.
const NO_READING_CM: f32 = -1.0;

pub struct UploadGatekeeper {
    min_upload_interval_ms: u64,
    connect_timeout_ms: u32,
    upload_timeout_ms: u32,
}

impl UploadGatekeeper {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            min_upload_interval_ms: config.min_upload_interval_ms,
            connect_timeout_ms: config.wifi_connect_timeout_ms,
            upload_timeout_ms: config.upload_timeout_ms,
        }
    }

    /// Rate-limit query: has the minimum inter-upload interval elapsed?
    pub fn allows(&self, now_ms: u64, last_upload_ms: u64) -> bool {
        now_ms.saturating_sub(last_upload_ms) >= self.min_upload_interval_ms
    }

    /// Run the full upload transaction for one confirmed motion event.
    ///
    /// Rate-limited attempts return [`UploadError::RateLimited`] before the
    /// connectivity collaborator is touched at all. Every other path —
    /// success included — ends with an unconditional `disconnect()`.
    pub fn try_upload(
        &self,
        now_ms: u64,
        last_upload_ms: u64,
        report: &MotionReport,
        net: &mut impl ConnectivityPort,
        telemetry: &mut impl TelemetryPort,
    ) -> Result<(), UploadError> {
        if !self.allows(now_ms, last_upload_ms) {
            info!(
                "Upload: rate limited ({} ms since last, {} ms required)",
                now_ms.saturating_sub(last_upload_ms),
                self.min_upload_interval_ms
            );
            return Err(UploadError::RateLimited);
        }

        let result = self.run_transaction(report, net, telemetry);
        // Teardown happens on success and on failure alike; the port
        // guarantees this is safe even if the link never came up.
        net.disconnect();
        result
    }

    fn run_transaction(
        &self,
        report: &MotionReport,
        net: &mut impl ConnectivityPort,
        telemetry: &mut impl TelemetryPort,
    ) -> Result<(), UploadError> {
        net.connect(self.connect_timeout_ms).map_err(|e| {
            warn!("Upload: connect failed — {}", e);
            UploadError::ConnectivityFailed
        })?;

        if !telemetry.await_ready(self.upload_timeout_ms) {
            warn!("Upload: telemetry session not ready within {} ms", self.upload_timeout_ms);
            return Err(UploadError::TelemetryNotReady);
        }

        self.publish_report(report, telemetry);

        if !telemetry.flush(self.upload_timeout_ms) {
            // Best effort: some fields may have landed, the rest are lost.
            warn!("Upload: flush timed out, record may be partial");
        }

        info!(
            "Upload: event #{} published (distance={:?} cm)",
            report.event_index, report.distance_cm
        );
        Ok(())
    }

    /// Fire-and-forget field writes; completion is awaited once in `flush`.
    fn publish_report(&self, report: &MotionReport, telemetry: &mut impl TelemetryPort) {
        let event = format!("{}/event_{}", EVENT_ROOT, report.event_index);
        let distance = report.distance_cm.unwrap_or(NO_READING_CM);

        telemetry.publish(&format!("{event}/distance_cm"), TelemetryValue::Float(distance));
        telemetry.publish(
            &format!("{event}/timestamp_ms"),
            TelemetryValue::Timestamp(report.timestamp_ms),
        );
        telemetry.publish(&format!("{event}/boot_count"), TelemetryValue::Uint(report.boot_count));
        telemetry.publish(&format!("{event}/motion_detected"), TelemetryValue::Flag(true));

        telemetry.publish(
            &format!("{STATS_ROOT}/total_events"),
            TelemetryValue::Uint(report.total_uploads),
        );
        telemetry.publish(
            &format!("{STATS_ROOT}/last_event_time"),
            TelemetryValue::Timestamp(report.timestamp_ms),
        );
        telemetry.publish(
            &format!("{STATS_ROOT}/last_distance"),
            TelemetryValue::Float(distance),
        );
    }
}
