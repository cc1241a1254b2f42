//! Deep-sleep entry and wake-cause classification.
//!
//! Suspension is not cooperative yielding: it is a full power-down with
//! execution resuming from the reset vector on timer expiry. On ESP-IDF
//! this wraps the `esp_sleep` API; on host targets it records the request
//! in atomics so tests and simulation can observe sleep decisions without
//! powering anything down.

use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Why the device woke for this activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Cold boot or reset — no sleep preceded this activation.
    PowerOn,
    /// The deep-sleep timer expired: resume the duty cycle.
    Timer,
    /// Some other wake source (GPIO, brown-out recovery, …).
    Other,
}

#[cfg(not(target_os = "espidf"))]
static SIM_WAKE_REASON: AtomicU8 = AtomicU8::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_LAST_SLEEP_MS: AtomicU64 = AtomicU64::new(0);

/// Host-side injection of the next reported wake reason.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_wake_reason(reason: WakeReason) {
    let raw = match reason {
        WakeReason::PowerOn => 0,
        WakeReason::Timer => 1,
        WakeReason::Other => 2,
    };
    SIM_WAKE_REASON.store(raw, Ordering::Relaxed);
}

/// Host-side view of the last requested sleep duration.
#[cfg(not(target_os = "espidf"))]
pub fn sim_last_sleep_ms() -> u64 {
    SIM_LAST_SLEEP_MS.load(Ordering::Relaxed)
}

pub struct PowerManager;

impl PowerManager {
    pub fn new() -> Self {
        Self
    }

    /// Classify why this activation started.
    #[cfg(target_os = "espidf")]
    pub fn wake_reason(&self) -> WakeReason {
        use esp_idf_svc::sys::{
            esp_sleep_get_wakeup_cause, esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED,
        };
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
            WakeReason::Timer
        } else if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED {
            WakeReason::PowerOn
        } else {
            WakeReason::Other
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn wake_reason(&self) -> WakeReason {
        match SIM_WAKE_REASON.load(Ordering::Relaxed) {
            1 => WakeReason::Timer,
            2 => WakeReason::Other,
            _ => WakeReason::PowerOn,
        }
    }

    /// Power the device down for `duration_ms`.
    ///
    /// On hardware this does not return — execution resumes at the reset
    /// vector when the timer fires.
    #[cfg(target_os = "espidf")]
    pub fn enter_deep_sleep(&mut self, duration_ms: u64) -> ! {
        info!("Entering deep sleep for {} s", duration_ms / 1000);
        unsafe {
            esp_idf_svc::sys::esp_sleep_enable_timer_wakeup(duration_ms * 1000);
            esp_idf_svc::sys::esp_deep_sleep_start();
        }
        unreachable!("esp_deep_sleep_start does not return");
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn enter_deep_sleep(&mut self, duration_ms: u64) {
        info!("Entering deep sleep for {} s (sim)", duration_ms / 1000);
        SIM_LAST_SLEEP_MS.store(duration_ms, Ordering::Relaxed);
        // Simulation returns immediately; the next wake is the caller's
        // next loop iteration.
        sim_set_wake_reason(WakeReason::Timer);
    }
}
