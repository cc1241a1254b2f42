//! Integration tests for the full activation pipeline.
//!
//! These run on the host and drive `AppService::run_activation` end to end
//! through mock ports: scripted sensor, manual clock, call-counting
//! connectivity, recording telemetry. Time is advanced by the clock mock,
//! so a 30-second monitoring window completes instantly.

use crate::mock_hw::{
    CountingNet, ManualClock, MemStorage, RecordingSink, RecordingTelemetry, ScriptedSensor,
};

use motionsentry::app::events::AppEvent;
use motionsentry::app::service::AppService;
use motionsentry::config::SystemConfig;
use motionsentry::error::UploadError;
use motionsentry::fsm::{SleepKind, StateId};
use motionsentry::power::WakeReason;
use motionsentry::retained::RetainedState;

fn transitions(events: &[AppEvent]) -> Vec<(StateId, StateId)> {
    events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn has_event(events: &[AppEvent], pred: impl Fn(&AppEvent) -> bool) -> bool {
    events.iter().any(pred)
}

/// Retained state with an established 50 cm baseline and a recent-enough
/// baseline stamp that no refresh fires mid-test.
fn with_baseline(baseline_update_ms: u64) -> RetainedState {
    let mut r = RetainedState::default();
    r.baseline_cm = Some(50.0);
    r.last_baseline_update_ms = baseline_update_ms;
    r
}

// ── Scenario A: first valid reading initialises the baseline ──

#[test]
fn first_reading_initialises_baseline_then_normal_sleep() {
    let mut app = AppService::new(SystemConfig::default(), RetainedState::default());
    let mut sensor = ScriptedSensor::always(Some(50.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(0);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::PowerOn,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(req.kind, SleepKind::Normal);
    assert_eq!(req.duration_ms, 10_000);
    assert_eq!(app.retained().baseline_cm, Some(50.0));
    assert_eq!(app.retained().boot_count, 1);
    assert!(transitions(&sink.events).is_empty(), "no in-process transition expected");
    assert!(has_event(&sink.events, |e| matches!(
        e,
        AppEvent::BaselineInitialised { distance_cm } if (*distance_cm - 50.0).abs() < 0.01
    )));

    // The flushed blob reads back with the sleep marker set.
    let stored = RetainedState::load(&storage);
    assert_eq!(stored.state(), StateId::DeepSleep);
    assert_eq!(stored.baseline_cm, Some(50.0));
    assert_eq!(stored.boot_count, 1);
}

// ── Scenario B: threshold crossing → monitor → confirm → upload ──

#[test]
fn confirmed_motion_uploads_and_closes_episode() {
    let mut app = AppService::new(SystemConfig::default(), with_baseline(200_000));
    // 35 cm against a 50 cm baseline: 15 cm change, threshold is 10 cm.
    let mut sensor = ScriptedSensor::always(Some(35.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(200_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(
        transitions(&sink.events),
        vec![
            (StateId::QuickCheck, StateId::ActiveMonitor),
            (StateId::ActiveMonitor, StateId::UploadEvent),
        ]
    );
    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::MotionCandidate { .. })));
    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::MotionConfirmed { .. })));
    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::UploadCompleted(_))));

    let r = app.retained();
    assert_eq!(r.motion_event_count, 1);
    assert_eq!(r.total_uploads, 1);
    assert!(!r.motion_active, "episode must be closed before sleep");
    // Window: 30 s after the 200 s start.
    assert_eq!(r.last_upload_ms, 230_000);
    assert_eq!(r.last_motion_ms, 200_000);

    assert_eq!(net.connect_calls, 1);
    assert_eq!(net.disconnect_calls, 1, "link dropped after success");
    assert!(telemetry.paths().contains(&"/motion_detection/events/event_0/distance_cm"));
    assert!(telemetry.paths().contains(&"/motion_detection/stats/total_events"));

    assert_eq!(req.kind, SleepKind::Normal);
}

// ── Unstable displacement never confirms ──────────────────────

#[test]
fn jittering_readings_are_a_false_alarm() {
    let mut app = AppService::new(SystemConfig::default(), with_baseline(200_000));
    // Candidate every sample, but consecutive readings 45 cm apart can
    // never satisfy the 5 cm stability tolerance.
    let mut script = vec![Some(35.0)]; // QuickCheck read
    for i in 0..20 {
        script.push(if i % 2 == 0 { Some(80.0) } else { Some(35.0) });
    }
    let mut sensor = ScriptedSensor::script(script, Some(35.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(200_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(transitions(&sink.events), vec![(StateId::QuickCheck, StateId::ActiveMonitor)]);
    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::FalseAlarm)));
    assert!(!has_event(&sink.events, |e| matches!(e, AppEvent::MotionConfirmed { .. })));

    assert_eq!(net.connect_calls, 0);
    assert_eq!(app.retained().total_uploads, 0);
    assert!(!app.retained().motion_active);
    assert_eq!(req.kind, SleepKind::Normal);
}

// ── Scenario D: confirmed but rate-limited ────────────────────

#[test]
fn rate_limited_confirmation_skips_upload_entirely() {
    let mut retained = with_baseline(400_000);
    retained.last_upload_ms = 380_000;

    let mut app = AppService::new(SystemConfig::default(), retained);
    let mut sensor = ScriptedSensor::always(Some(35.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(400_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    // Window ends at 430 s; 50 s since the last upload < 60 s minimum.
    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::UploadSkipped)));
    assert_eq!(
        transitions(&sink.events),
        vec![(StateId::QuickCheck, StateId::ActiveMonitor)],
        "UploadEvent must not be entered"
    );
    assert_eq!(net.connect_calls, 0, "rate limiting happens before any I/O");
    assert_eq!(app.retained().total_uploads, 0);
    assert_eq!(app.retained().last_upload_ms, 380_000);
    assert!(!app.retained().motion_active);
    assert_eq!(req.kind, SleepKind::Normal);
}

// ── Scenario E: quiet period chooses extended sleep ───────────

#[test]
fn quiet_period_extends_sleep() {
    let mut retained = with_baseline(300_000);
    retained.last_motion_ms = 10_000;

    let mut app = AppService::new(SystemConfig::default(), retained);
    let mut sensor = ScriptedSensor::always(Some(50.0)); // no change vs baseline
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(310_001); // 300 001 ms since last motion
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(req.kind, SleepKind::Extended);
    assert_eq!(req.duration_ms, 30_000);
}

#[test]
fn recent_motion_keeps_normal_sleep() {
    let mut retained = with_baseline(300_000);
    retained.last_motion_ms = 280_000;

    let mut app = AppService::new(SystemConfig::default(), retained);
    let mut sensor = ScriptedSensor::always(Some(50.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(310_000); // only 30 s of quiet
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(req.kind, SleepKind::Normal);
}

#[test]
fn no_motion_ever_seen_means_normal_sleep() {
    // last_motion_ms == 0 is "never", which must not count as quiet.
    let mut app = AppService::new(SystemConfig::default(), with_baseline(400_000));
    let mut sensor = ScriptedSensor::always(Some(50.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(400_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(req.kind, SleepKind::Normal);
}

// ── Scenario F: connectivity timeout during upload ────────────

#[test]
fn connect_timeout_fails_upload_and_recovers() {
    let mut app = AppService::new(SystemConfig::default(), with_baseline(200_000));
    let mut sensor = ScriptedSensor::always(Some(35.0));
    let mut net = CountingNet::new(false);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(200_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert!(has_event(&sink.events, |e| matches!(
        e,
        AppEvent::UploadFailed(UploadError::ConnectivityFailed)
    )));
    assert_eq!(app.retained().total_uploads, 0);
    assert_eq!(app.retained().last_upload_ms, 0);
    assert!(!app.retained().motion_active);
    assert_eq!(net.disconnect_calls, 1, "teardown runs even after a failed connect");
    assert!(telemetry.writes.is_empty());
    assert_eq!(telemetry.ready_calls, 0);
    assert_eq!(req.kind, SleepKind::Normal);
}

#[test]
fn telemetry_session_timeout_disconnects_and_recovers() {
    let mut app = AppService::new(SystemConfig::default(), with_baseline(200_000));
    let mut sensor = ScriptedSensor::always(Some(35.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(false);
    let mut clock = ManualClock::at(200_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let _ = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert!(has_event(&sink.events, |e| matches!(
        e,
        AppEvent::UploadFailed(UploadError::TelemetryNotReady)
    )));
    assert_eq!(net.connect_calls, 1);
    assert_eq!(net.disconnect_calls, 1);
    assert!(telemetry.writes.is_empty());
    assert_eq!(app.retained().total_uploads, 0);
}

// ── Sensor failure path ───────────────────────────────────────

#[test]
fn sensor_failure_sleeps_normal_without_touching_baseline() {
    let mut app = AppService::new(SystemConfig::default(), RetainedState::default());
    let mut sensor = ScriptedSensor::always(None);
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(5_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let req = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert!(has_event(&sink.events, |e| matches!(e, AppEvent::SensorUnavailable)));
    assert_eq!(app.retained().baseline_cm, None);
    assert_eq!(app.retained().motion_event_count, 0);
    assert_eq!(req.kind, SleepKind::Normal);
    assert_eq!(sensor.calls, 1, "one read per quick check, no retries");
}

// ── Baseline refresh policy ───────────────────────────────────

#[test]
fn stale_baseline_refreshes_on_quiet_scene() {
    let mut retained = with_baseline(0);
    retained.last_motion_ms = 350_000; // recent enough to keep normal sleep

    let mut app = AppService::new(SystemConfig::default(), retained);
    let mut sensor = ScriptedSensor::always(Some(52.0)); // 2 cm drift, no candidate
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(400_000);
    let mut storage = MemStorage::new();
    let mut sink = RecordingSink::new();

    let _ = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert!(has_event(&sink.events, |e| matches!(
        e,
        AppEvent::BaselineRefreshed { distance_cm } if (*distance_cm - 52.0).abs() < 0.01
    )));
    assert_eq!(app.retained().baseline_cm, Some(52.0));
    assert_eq!(app.retained().last_baseline_update_ms, 400_000);
}

// ── Persistence across activations ────────────────────────────

#[test]
fn state_survives_between_activations() {
    let config = SystemConfig::default();
    let mut storage = MemStorage::new();

    // Activation 1: cold boot, baseline init.
    {
        let mut app = AppService::new(config.clone(), RetainedState::default());
        let mut sensor = ScriptedSensor::always(Some(50.0));
        let mut net = CountingNet::new(true);
        let mut telemetry = RecordingTelemetry::new(true);
        let mut clock = ManualClock::at(0);
        let mut sink = RecordingSink::new();
        let _ = app.run_activation(
            WakeReason::PowerOn,
            &mut sensor,
            &mut net,
            &mut telemetry,
            &mut clock,
            &mut storage,
            &mut sink,
        );
    }

    // Activation 2: timer wake restores the same book-keeping.
    let restored = RetainedState::load(&storage);
    assert_eq!(restored.boot_count, 1);
    assert_eq!(restored.baseline_cm, Some(50.0));
    assert_eq!(restored.state(), StateId::DeepSleep);

    let mut app = AppService::new(config, restored);
    let mut sensor = ScriptedSensor::always(Some(50.0));
    let mut net = CountingNet::new(true);
    let mut telemetry = RecordingTelemetry::new(true);
    let mut clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();
    let _ = app.run_activation(
        WakeReason::Timer,
        &mut sensor,
        &mut net,
        &mut telemetry,
        &mut clock,
        &mut storage,
        &mut sink,
    );

    assert_eq!(app.retained().boot_count, 2);
    assert_eq!(RetainedState::load(&storage).boot_count, 2);
}

#[test]
fn corrupt_retained_blob_cold_starts() {
    let mut storage = MemStorage::new();
    storage.inject("sentry", "retained", &[0xFF, 0xFF, 0xFF]);

    let restored = RetainedState::load(&storage);
    assert_eq!(restored.boot_count, 0);
    assert_eq!(restored.baseline_cm, None);
    assert_eq!(restored.state(), StateId::QuickCheck);
}

// ── Every activation ends with a sleep event ──────────────────

#[test]
fn last_event_is_always_entering_sleep() {
    for reading in [Some(50.0), Some(35.0), None] {
        let mut app = AppService::new(SystemConfig::default(), with_baseline(200_000));
        let mut sensor = ScriptedSensor::always(reading);
        let mut net = CountingNet::new(true);
        let mut telemetry = RecordingTelemetry::new(true);
        let mut clock = ManualClock::at(200_000);
        let mut storage = MemStorage::new();
        let mut sink = RecordingSink::new();

        let _ = app.run_activation(
            WakeReason::Timer,
            &mut sensor,
            &mut net,
            &mut telemetry,
            &mut clock,
            &mut storage,
            &mut sink,
        );

        assert!(matches!(
            sink.events.last(),
            Some(AppEvent::EnteringSleep { .. })
        ));
    }
}
