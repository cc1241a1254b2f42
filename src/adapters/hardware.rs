//! Hardware adapter — bridges the ultrasonic ranger to the sensor port.
//!
//! This is the only module that touches real pins. On ESP-IDF it owns an
//! [`UltrasonicRanger`] built from esp-idf-hal pin drivers; on host targets
//! readings are injected through an atomic so tests and simulation can
//! script the scene.

use log::warn;

use crate::app::ports::DistanceSensorPort;
use crate::sensors::PulseRange;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

/// Host-side injected reading, stored as `f32` bits. `NO_READING` = the
/// sensor reports nothing this poll.
#[cfg(not(target_os = "espidf"))]
static SIM_DISTANCE_BITS: AtomicU32 = AtomicU32::new(NO_READING);

#[cfg(not(target_os = "espidf"))]
const NO_READING: u32 = u32::MAX;

/// Inject the next simulated reading (`None` = echo timeout).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_distance(reading: Option<f32>) {
    let bits = match reading {
        Some(cm) => cm.to_bits(),
        None => NO_READING,
    };
    SIM_DISTANCE_BITS.store(bits, Ordering::Relaxed);
}

pub struct HardwareAdapter {
    range: PulseRange,
    #[cfg(target_os = "espidf")]
    ranger: crate::sensors::UltrasonicRanger<
        esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
        esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyInputPin, esp_idf_hal::gpio::Input>,
        esp_idf_hal::delay::Delay,
    >,
}

#[cfg(target_os = "espidf")]
impl HardwareAdapter {
    pub fn new(
        trig: esp_idf_hal::gpio::AnyOutputPin,
        echo: esp_idf_hal::gpio::AnyInputPin,
        range: PulseRange,
    ) -> anyhow::Result<Self> {
        let trig = esp_idf_hal::gpio::PinDriver::output(trig)?;
        let echo = esp_idf_hal::gpio::PinDriver::input(echo)?;
        let delay = esp_idf_hal::delay::Delay::new_default();
        Ok(Self {
            ranger: crate::sensors::UltrasonicRanger::new(trig, echo, delay, range),
            range,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl HardwareAdapter {
    pub fn new(range: PulseRange) -> Self {
        Self { range }
    }
}

impl DistanceSensorPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn measure_distance(&mut self) -> Option<f32> {
        match self.ranger.measure() {
            Ok(cm) => Some(cm),
            Err(e) => {
                warn!("Ultrasonic: {}", e);
                None
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn measure_distance(&mut self) -> Option<f32> {
        let bits = SIM_DISTANCE_BITS.load(Ordering::Relaxed);
        if bits == NO_READING {
            return None;
        }
        let cm = f32::from_bits(bits);
        // The sim path applies the same plausibility window as the driver.
        if cm < self.range.min_cm || cm > self.range.max_cm {
            warn!("Ultrasonic(sim): {:.1} cm outside plausible range", cm);
            return None;
        }
        Some(cm)
    }
}
