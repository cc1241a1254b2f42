//! Crash note capture.
//!
//! A single NVS slot holds the reason for the most recent panic. The panic
//! hook writes it on the way down; the next boot reads it back, logs it,
//! and clears the slot. One slot is enough on a device that reboots into a
//! ten-second duty cycle — only the latest crash is actionable.

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;

const CRASH_NAMESPACE: &str = "crash";
const CRASH_KEY: &str = "last";
const CRASH_BLOB_MAX: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashNote {
    /// Boot counter at crash time (0 when unknown).
    pub boot_count: u32,
    pub reason: heapless::String<96>,
}

impl CrashNote {
    pub fn new(boot_count: u32, reason: &str) -> Self {
        let mut end = reason.len().min(95);
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        let mut r = heapless::String::new();
        let _ = r.push_str(&reason[..end]);
        Self {
            boot_count,
            reason: r,
        }
    }
}

/// Persist a crash note, overwriting any previous one.
pub fn record(storage: &mut impl StoragePort, note: &CrashNote) {
    if let Ok(bytes) = postcard::to_allocvec(note) {
        let _ = storage.write(CRASH_NAMESPACE, CRASH_KEY, &bytes);
    }
}

/// Read and clear the stored crash note, if any.
pub fn take_last(storage: &mut impl StoragePort) -> Option<CrashNote> {
    let mut buf = [0u8; CRASH_BLOB_MAX];
    let len = storage.read(CRASH_NAMESPACE, CRASH_KEY, &mut buf).ok()?;
    let note = postcard::from_bytes::<CrashNote>(&buf[..len]).ok();
    let _ = storage.delete(CRASH_NAMESPACE, CRASH_KEY);
    if note.is_none() {
        warn!("Diagnostics: stored crash note was corrupt");
    }
    note
}

/// Install a panic hook that persists the reason before the reset.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "panic (no message)".to_string()
        };
        error!("PANIC: {}", reason);

        // On hardware, write the note through a fresh NVS handle — flash is
        // already initialised by the time any panic can occur.
        #[cfg(target_os = "espidf")]
        {
            let mut nvs = crate::adapters::nvs::NvsAdapter::default();
            record(&mut nvs, &CrashNote::new(0, &reason));
        }
    }));
}
