//! Driven adapters: concrete implementations of the port traits.
//!
//! Each adapter is dual-target — real ESP-IDF peripherals behind
//! `#[cfg(target_os = "espidf")]`, simulation backends everywhere else.

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telemetry;
pub mod time;
pub mod wifi;
