//! MotionSentry firmware — main entry point.
//!
//! One activation per process lifetime:
//!
//! ```text
//! boot ──▶ load config + retained state ──▶ AppService::run_activation
//!                                                     │
//!          deep sleep (timer wake) ◀── persist ◀──────┘
//! ```
//!
//! Everything below the port boundary is hardware; everything above it is
//! the host-testable library crate.
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use motionsentry::adapters::hardware::HardwareAdapter;
use motionsentry::adapters::log_sink::LogEventSink;
use motionsentry::adapters::nvs::NvsAdapter;
use motionsentry::adapters::telemetry::CloudTelemetry;
use motionsentry::adapters::time::MonotonicClock;
use motionsentry::adapters::wifi::WifiAdapter;
use motionsentry::app::ports::ConfigPort;
use motionsentry::app::service::AppService;
use motionsentry::config::SystemConfig;
use motionsentry::diagnostics;
use motionsentry::pins;
use motionsentry::power::PowerManager;
use motionsentry::retained::RetainedState;
use motionsentry::sensors::PulseRange;

// Provisioned at build time through the environment; empty credentials keep
// the duty cycle alive with uploads failing until the device is flashed
// with real ones.
const WIFI_SSID: &str = match option_env!("SENTRY_WIFI_SSID") {
    Some(v) => v,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("SENTRY_WIFI_PASSWORD") {
    Some(v) => v,
    None => "",
};
const RTDB_URL: &str = match option_env!("SENTRY_RTDB_URL") {
    Some(v) => v,
    None => "https://motionsentry-default-rtdb.firebaseio.com",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("==========================================");
    info!("  MotionSentry v{}", env!("CARGO_PKG_VERSION"));
    info!("  24-hour battery motion monitoring");
    info!("==========================================");

    diagnostics::install_panic_hook();

    // ── 2. Storage, crash note, config ────────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::default()
        }
    };

    if let Some(note) = diagnostics::take_last(&mut nvs) {
        warn!(
            "Previous run panicked (boot #{}): {}",
            note.boot_count, note.reason
        );
    }

    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Wake cause + retained state ────────────────────────
    let mut power = PowerManager::new();
    let wake = power.wake_reason();
    let retained = RetainedState::load(&nvs);
    info!(
        "Wake: {:?} | boots={} uploads={} motion_events={}",
        wake, retained.boot_count, retained.total_uploads, retained.motion_event_count
    );

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;

    info!(
        "Ultrasonic ranger on GPIO{} (trig) / GPIO{} (echo)",
        pins::ULTRASONIC_TRIG_GPIO,
        pins::ULTRASONIC_ECHO_GPIO
    );
    let mut hw = HardwareAdapter::new(
        peripherals.pins.gpio2.into(),
        peripherals.pins.gpio3.into(),
        PulseRange::from_config(&config),
    )?;

    let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let esp_wifi = esp_idf_svc::wifi::EspWifi::new(peripherals.modem, sysloop, None)?;
    let mut wifi = WifiAdapter::new(esp_wifi);
    if let Err(e) = wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD) {
        warn!("WiFi credentials invalid ({}); uploads will fail until provisioned", e);
    }

    let mut telemetry = CloudTelemetry::new(RTDB_URL);
    let mut clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    // ── 5. One activation, then back to sleep ─────────────────
    let mut app = AppService::new(config, retained);
    let request = app.run_activation(
        wake,
        &mut hw,
        &mut wifi,
        &mut telemetry,
        &mut clock,
        &mut nvs,
        &mut sink,
    );

    power.enter_deep_sleep(request.duration_ms)
}
