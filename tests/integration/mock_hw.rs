//! Mock port implementations for integration tests.
//!
//! Records every collaborator interaction so tests can assert on call
//! counts and full event history without hardware or real waiting.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

use motionsentry::app::events::AppEvent;
use motionsentry::app::ports::{
    ClockPort, ConnectivityError, ConnectivityPort, DistanceSensorPort, EventSink, StorageError,
    StoragePort, TelemetryPort, TelemetryValue,
};

// ── Scripted distance sensor ──────────────────────────────────

pub struct ScriptedSensor {
    queue: VecDeque<Option<f32>>,
    default: Option<f32>,
    pub calls: u32,
}

#[allow(dead_code)]
impl ScriptedSensor {
    /// Every poll returns the same reading.
    pub fn always(reading: Option<f32>) -> Self {
        Self {
            queue: VecDeque::new(),
            default: reading,
            calls: 0,
        }
    }

    /// Scripted prefix, then `default` forever.
    pub fn script(readings: Vec<Option<f32>>, default: Option<f32>) -> Self {
        Self {
            queue: readings.into(),
            default,
            calls: 0,
        }
    }
}

impl DistanceSensorPort for ScriptedSensor {
    fn measure_distance(&mut self) -> Option<f32> {
        self.calls += 1;
        self.queue.pop_front().unwrap_or(self.default)
    }
}

// ── Manually advanced clock ───────────────────────────────────

/// Time only moves when the code under test calls `delay_ms`, so a 30 s
/// monitoring window runs in microseconds of wall time.
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now.set(self.now.get() + u64::from(ms));
    }
}

// ── Call-counting connectivity ────────────────────────────────

pub struct CountingNet {
    pub connect_calls: u32,
    pub disconnect_calls: u32,
    pub connect_ok: bool,
    connected: bool,
}

#[allow(dead_code)]
impl CountingNet {
    pub fn new(connect_ok: bool) -> Self {
        Self {
            connect_calls: 0,
            disconnect_calls: 0,
            connect_ok,
            connected: false,
        }
    }
}

impl ConnectivityPort for CountingNet {
    fn connect(&mut self, _timeout_ms: u32) -> Result<(), ConnectivityError> {
        self.connect_calls += 1;
        if self.connect_ok {
            self.connected = true;
            Ok(())
        } else {
            Err(ConnectivityError::Timeout)
        }
    }

    fn disconnect(&mut self) {
        self.disconnect_calls += 1;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Recording telemetry sink ──────────────────────────────────

pub struct RecordingTelemetry {
    pub ready: bool,
    pub writes: Vec<(String, TelemetryValue)>,
    pub ready_calls: u32,
}

#[allow(dead_code)]
impl RecordingTelemetry {
    pub fn new(ready: bool) -> Self {
        Self {
            ready,
            writes: Vec::new(),
            ready_calls: 0,
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.writes.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl TelemetryPort for RecordingTelemetry {
    fn await_ready(&mut self, _timeout_ms: u32) -> bool {
        self.ready_calls += 1;
        self.ready
    }

    fn publish(&mut self, path: &str, value: TelemetryValue) {
        self.writes.push((path.to_string(), value));
    }

    fn flush(&mut self, _timeout_ms: u32) -> bool {
        true
    }
}

// ── In-memory storage ─────────────────────────────────────────

#[derive(Default)]
pub struct MemStorage {
    store: HashMap<String, Vec<u8>>,
}

#[allow(dead_code)]
impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Overwrite a raw blob (for corruption tests).
    pub fn inject(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.store.insert(Self::key(namespace, key), data.to_vec());
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&Self::key(namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store.insert(Self::key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::key(namespace, key))
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
