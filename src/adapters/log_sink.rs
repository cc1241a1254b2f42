//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). The serial trace is the only
//! human-visible record of a cycle that decides not to upload.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ActivationStarted { boot_count, wake } => {
                info!("CYCLE | boot #{} | wake={:?}", boot_count, wake);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::SensorUnavailable => {
                warn!("SENSE | no reading");
            }
            AppEvent::BaselineInitialised { distance_cm } => {
                info!("BASE  | initialised at {:.2} cm", distance_cm);
            }
            AppEvent::BaselineRefreshed { distance_cm } => {
                info!("BASE  | refreshed to {:.2} cm", distance_cm);
            }
            AppEvent::MotionCandidate {
                distance_cm,
                baseline_cm,
            } => {
                info!(
                    "MOTION| candidate {:.1} cm (baseline {:.1} cm)",
                    distance_cm, baseline_cm
                );
            }
            AppEvent::MotionConfirmed { distance_cm } => {
                info!("MOTION| confirmed at {:.1} cm", distance_cm);
            }
            AppEvent::FalseAlarm => {
                info!("MOTION| not confirmed, false alarm");
            }
            AppEvent::UploadSkipped => {
                info!("UPLOAD| skipped (rate limit)");
            }
            AppEvent::UploadCompleted(report) => {
                info!(
                    "UPLOAD| event #{} | {:.1} cm | uploads={} events={} boots={}",
                    report.event_index,
                    report.distance_cm.unwrap_or(-1.0),
                    report.total_uploads,
                    report.motion_event_count,
                    report.boot_count,
                );
            }
            AppEvent::UploadFailed(e) => {
                warn!("UPLOAD| failed: {}", e);
            }
            AppEvent::EnteringSleep { kind, duration_ms } => {
                info!("SLEEP | {:?} for {} s", kind, duration_ms / 1000);
            }
        }
    }
}
