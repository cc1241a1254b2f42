//! Cloud telemetry adapter — RTDB-style key/value writes over HTTPS.
//!
//! Implements [`TelemetryPort`]. Fields are queued locally by `publish`
//! (fire-and-forget) and the queue is drained by one bounded `flush`; the
//! record is best-effort, a flush timeout can leave it partially written
//! and the caller tolerates that.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: each queued field becomes an HTTP `PUT`
//!   of a JSON scalar to `<base_url><path>.json`.
//! - **all other targets**: a recording simulation for tests and host runs.

use log::info;

use crate::app::ports::{TelemetryPort, TelemetryValue};

/// Render a telemetry scalar as its JSON wire value.
pub fn json_value(value: TelemetryValue) -> serde_json::Value {
    match value {
        TelemetryValue::Float(v) => serde_json::Value::from(f64::from(v)),
        TelemetryValue::Uint(v) => serde_json::Value::from(v),
        TelemetryValue::Timestamp(v) => serde_json::Value::from(v),
        TelemetryValue::Flag(v) => serde_json::Value::from(v),
    }
}

pub struct CloudTelemetry {
    base_url: String,
    pending: Vec<(String, serde_json::Value)>,
    #[cfg(not(target_os = "espidf"))]
    sim_ready: bool,
}

impl CloudTelemetry {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pending: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_ready: true,
        }
    }

    /// Script session readiness (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_ready(&mut self, ready: bool) {
        self.sim_ready = ready;
    }

    /// Queued fields not yet flushed (simulation observability).
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_ready(&mut self, timeout_ms: u32) -> bool {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        // Session readiness = the TLS client can reach the sink at all.
        let started = std::time::Instant::now();
        loop {
            let probe = EspHttpConnection::new(&Configuration {
                use_global_ca_store: true,
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            });
            match probe {
                Ok(mut conn) => {
                    let url = format!("{}/.json?shallow=true", self.base_url);
                    if conn.initiate_request(esp_idf_svc::http::Method::Get, &url, &[]).is_ok()
                        && conn.initiate_response().is_ok()
                    {
                        return true;
                    }
                }
                Err(e) => log::warn!("Telemetry: client init failed ({e})"),
            }
            if started.elapsed().as_millis() as u32 >= timeout_ms {
                return false;
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(50);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ready(&mut self, _timeout_ms: u32) -> bool {
        self.sim_ready
    }

    #[cfg(target_os = "espidf")]
    fn platform_flush(&mut self, timeout_ms: u32) -> bool {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let started = std::time::Instant::now();
        while let Some((path, value)) = self.pending.first().cloned() {
            if started.elapsed().as_millis() as u32 >= timeout_ms {
                log::warn!("Telemetry: flush deadline, {} field(s) unsent", self.pending.len());
                return false;
            }

            let url = format!("{}{}.json", self.base_url, path);
            let body = value.to_string();
            let mut sent = false;
            match EspHttpConnection::new(&Configuration {
                use_global_ca_store: true,
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            }) {
                Ok(mut conn) => {
                    sent = conn
                        .initiate_request(
                            esp_idf_svc::http::Method::Put,
                            &url,
                            &[("Content-Type", "application/json")],
                        )
                        .is_ok()
                        && conn.write(body.as_bytes()).is_ok()
                        && conn.initiate_response().is_ok();
                }
                Err(e) => log::warn!("Telemetry: client init failed ({e})"),
            }

            if !sent {
                log::warn!("Telemetry: PUT {} failed", path);
            }
            // Field is consumed either way — fire and forget, no retries.
            self.pending.remove(0);
        }
        info!("Telemetry: queue drained");
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_flush(&mut self, _timeout_ms: u32) -> bool {
        for (path, value) in self.pending.drain(..) {
            info!("Telemetry(sim): {} = {}", path, value);
        }
        true
    }
}

impl TelemetryPort for CloudTelemetry {
    fn await_ready(&mut self, timeout_ms: u32) -> bool {
        self.platform_ready(timeout_ms)
    }

    fn publish(&mut self, path: &str, value: TelemetryValue) {
        self.pending.push((path.to_string(), json_value(value)));
    }

    fn flush(&mut self, timeout_ms: u32) -> bool {
        self.platform_flush(timeout_ms)
    }
}
