//! Application service — the duty-cycle controller.
//!
//! [`AppService`] owns the retained state and sequences one *activation*:
//! the run from wake to the next sleep request. All I/O flows through port
//! traits injected at the call site, making the entire cycle testable with
//! mock adapters.
//!
//! ```text
//!  DistanceSensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ClockPort          ──▶ │          AppService          │
//!  ConnectivityPort  ◀──▶ │  QuickCheck · ActiveMonitor  │
//!  TelemetryPort     ◀──▶ │  UploadEvent · sleep policy  │
//!  StoragePort       ◀──▶ └──────────────────────────────┘
//! ```
//!
//! Each state handler runs to completion and returns an explicit [`Step`];
//! no handler observes another's partial results. The retained state has
//! exactly one writer — this service — and every exit path flushes a
//! consistent snapshot before the sleep request is handed back.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::baseline::BaselineTracker;
use crate::control::motion::{ConfirmFilter, MotionDetector};
use crate::fsm::{SleepKind, SleepRequest, StateId, Step};
use crate::power::WakeReason;
use crate::retained::RetainedState;

use super::events::{AppEvent, MotionReport};
use super::ports::{
    ClockPort, ConnectivityPort, DistanceSensorPort, EventSink, StoragePort, TelemetryPort,
};
use super::uplink::UploadGatekeeper;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The duty-cycle controller.
pub struct AppService {
    config: SystemConfig,
    retained: RetainedState,
    detector: MotionDetector,
    baseline: BaselineTracker,
    gatekeeper: UploadGatekeeper,
}

impl AppService {
    /// Construct the service from configuration and restored state.
    pub fn new(config: SystemConfig, retained: RetainedState) -> Self {
        let detector = MotionDetector::new(config.motion_threshold_cm);
        let baseline = BaselineTracker::new(config.baseline_update_interval_ms);
        let gatekeeper = UploadGatekeeper::new(&config);
        Self {
            config,
            retained,
            detector,
            baseline,
            gatekeeper,
        }
    }

    /// Current machine state.
    pub fn state(&self) -> StateId {
        self.retained.state()
    }

    /// Read-only view of the retained state (for diagnostics and tests).
    pub fn retained(&self) -> &RetainedState {
        &self.retained
    }

    // ── Activation ────────────────────────────────────────────

    /// Run one activation: wake book-keeping, state handlers until a sleep
    /// decision falls out, then flush retained state.
    ///
    /// Never panics and never returns an error — every failure inside a
    /// handler is absorbed into a sleep decision so the duty cycle survives
    /// anything short of a power loss.
    pub fn run_activation(
        &mut self,
        wake: WakeReason,
        sensor: &mut impl DistanceSensorPort,
        net: &mut impl ConnectivityPort,
        telemetry: &mut impl TelemetryPort,
        clock: &mut impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> SleepRequest {
        self.retained.note_boot(wake);
        sink.emit(&AppEvent::ActivationStarted {
            boot_count: self.retained.boot_count,
            wake,
        });

        let kind = loop {
            let current = self.retained.state();
            let step = match current {
                StateId::QuickCheck => self.quick_check(sensor, clock, sink),
                StateId::ActiveMonitor => self.active_monitor(sensor, clock, sink),
                StateId::UploadEvent => self.upload_event(sensor, net, telemetry, clock, sink),
                // A persisted DeepSleep marker reaching dispatch means the
                // wake path was skipped; resume the duty cycle at the top.
                StateId::DeepSleep => Step::Goto(StateId::QuickCheck),
            };

            match step {
                Step::Goto(next) => {
                    info!("State: {} -> {}", current.name(), next.name());
                    sink.emit(&AppEvent::StateChanged {
                        from: current,
                        to: next,
                    });
                    self.retained.set_state(next);
                }
                Step::Sleep(kind) => break kind,
            }
        };

        let duration_ms = match kind {
            SleepKind::Normal => self.config.deep_sleep_normal_ms,
            SleepKind::Extended => self.config.deep_sleep_extended_ms,
        };

        self.retained.set_state(StateId::DeepSleep);
        self.retained.store(storage);
        sink.emit(&AppEvent::EnteringSleep { kind, duration_ms });

        SleepRequest { kind, duration_ms }
    }

    // ── QuickCheck ────────────────────────────────────────────
    //
    // One cheap sensor read decides whether this activation is worth more
    // than a few milliseconds of awake time.

    fn quick_check(
        &mut self,
        sensor: &mut impl DistanceSensorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Step {
        let now = clock.now_ms();

        let Some(distance) = sensor.measure_distance() else {
            warn!("QuickCheck: sensor read failed, returning to sleep");
            sink.emit(&AppEvent::SensorUnavailable);
            return Step::Sleep(SleepKind::Normal);
        };

        // First valid reading ever seen initialises the baseline.
        if self.retained.baseline_cm.is_none() {
            self.baseline.update(&mut self.retained, distance, now);
            sink.emit(&AppEvent::BaselineInitialised {
                distance_cm: distance,
            });
            return Step::Sleep(SleepKind::Normal);
        }

        // Periodic refresh, suppressed while a motion episode is open.
        if self.baseline.refresh_due(&self.retained, now) {
            self.baseline.update(&mut self.retained, distance, now);
            sink.emit(&AppEvent::BaselineRefreshed {
                distance_cm: distance,
            });
        }

        if let Some(baseline_cm) = self.retained.baseline_cm {
            if self.detector.candidate(Some(baseline_cm), Some(distance)) {
                info!(
                    "QuickCheck: candidate motion ({:.1} cm vs baseline {:.1} cm)",
                    distance, baseline_cm
                );
                self.retained.motion_active = true;
                self.retained.last_motion_ms = now;
                self.retained.motion_event_count = self.retained.motion_event_count.wrapping_add(1);
                sink.emit(&AppEvent::MotionCandidate {
                    distance_cm: distance,
                    baseline_cm,
                });
                return Step::Goto(StateId::ActiveMonitor);
            }
        }

        // The extended-sleep decision lives only in this no-motion branch.
        if self.retained.last_motion_ms > 0
            && now.saturating_sub(self.retained.last_motion_ms) > self.config.quiet_period_threshold_ms
        {
            info!("QuickCheck: quiet period, extending sleep");
            return Step::Sleep(SleepKind::Extended);
        }

        Step::Sleep(SleepKind::Normal)
    }

    // ── ActiveMonitor ─────────────────────────────────────────
    //
    // Bounded poll loop: fixed cadence over a fixed window, feeding the
    // confirmation debounce. The window always runs to completion.

    fn active_monitor(
        &mut self,
        sensor: &mut impl DistanceSensorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Step {
        let window_start = clock.now_ms();
        let mut filter = ConfirmFilter::new(
            self.config.motion_stability_tolerance_cm,
            self.config.motion_confirm_time_ms,
        );
        let mut announced = false;

        info!(
            "ActiveMonitor: {} s window at {} ms cadence",
            self.config.active_monitor_duration_ms / 1000,
            self.config.active_monitor_interval_ms
        );

        while clock.now_ms().saturating_sub(window_start) < self.config.active_monitor_duration_ms {
            let now = clock.now_ms();

            if let Some(distance) = sensor.measure_distance() {
                let candidate = self
                    .detector
                    .candidate(self.retained.baseline_cm, Some(distance));
                let confirmed = filter.observe(now, distance, candidate);

                if confirmed && !announced {
                    announced = true;
                    info!("ActiveMonitor: motion confirmed at {:.1} cm", distance);
                    sink.emit(&AppEvent::MotionConfirmed {
                        distance_cm: distance,
                    });
                }
            } else {
                warn!("ActiveMonitor: sensor read failed");
            }

            clock.delay_ms(self.config.active_monitor_interval_ms);
        }

        if filter.is_confirmed() {
            let now = clock.now_ms();
            if self.gatekeeper.allows(now, self.retained.last_upload_ms) {
                return Step::Goto(StateId::UploadEvent);
            }
            info!("ActiveMonitor: upload rate limit, skipping");
            sink.emit(&AppEvent::UploadSkipped);
            self.retained.motion_active = false;
            return Step::Sleep(SleepKind::Normal);
        }

        info!("ActiveMonitor: motion not confirmed, false alarm");
        sink.emit(&AppEvent::FalseAlarm);
        self.retained.motion_active = false;
        Step::Sleep(SleepKind::Normal)
    }

    // ── UploadEvent ───────────────────────────────────────────
    //
    // The only state allowed to spend power on the radio. Outcome either
    // way is a normal-interval sleep with the motion episode closed.

    fn upload_event(
        &mut self,
        sensor: &mut impl DistanceSensorPort,
        net: &mut impl ConnectivityPort,
        telemetry: &mut impl TelemetryPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Step {
        // Final reading for the published record; a failed read uploads the
        // no-reading sentinel rather than aborting the event.
        let final_distance = sensor.measure_distance();
        let now = clock.now_ms();

        let report = MotionReport {
            event_index: self.retained.total_uploads,
            distance_cm: final_distance,
            timestamp_ms: now,
            boot_count: self.retained.boot_count,
            motion_event_count: self.retained.motion_event_count,
            total_uploads: self.retained.total_uploads.wrapping_add(1),
        };

        match self.gatekeeper.try_upload(
            now,
            self.retained.last_upload_ms,
            &report,
            net,
            telemetry,
        ) {
            Ok(()) => {
                self.retained.total_uploads = self.retained.total_uploads.wrapping_add(1);
                self.retained.last_upload_ms = clock.now_ms();
                info!(
                    "UploadEvent: done (uploads={}, events={}, boots={})",
                    self.retained.total_uploads,
                    self.retained.motion_event_count,
                    self.retained.boot_count
                );
                sink.emit(&AppEvent::UploadCompleted(report));
            }
            Err(e) => {
                warn!("UploadEvent: {}", e);
                sink.emit(&AppEvent::UploadFailed(e));
            }
        }

        self.retained.motion_active = false;
        Step::Sleep(SleepKind::Normal)
    }
}
