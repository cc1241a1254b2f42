//! HC-SR04 ultrasonic ranger driver.
//!
//! Generic over `embedded-hal` 1.0 pins and delay so the same driver runs
//! against ESP-IDF GPIO on hardware and mock pins in tests. Measurement:
//! a 10 µs trigger pulse, then a busy-poll on the echo line with a 1 µs
//! cadence and a hard iteration cap — the driver never blocks beyond the
//! echo timeout. Round-trip time converts to centimetres at 58.2 µs/cm.
//!
//! No retries here: a timeout or implausible echo is reported as-is and the
//! caller decides what repeated failures mean.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::SystemConfig;
use crate::error::SensorError;

/// Round-trip microseconds per centimetre of distance (air, ~20 °C).
const US_PER_CM: f32 = 58.2;

/// Echo timing and plausibility window.
#[derive(Debug, Clone, Copy)]
pub struct PulseRange {
    /// Maximum wait for the echo edge and maximum pulse width (µs).
    pub echo_timeout_us: u32,
    /// Shortest plausible distance (cm).
    pub min_cm: f32,
    /// Longest plausible distance (cm).
    pub max_cm: f32,
}

impl PulseRange {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            echo_timeout_us: config.echo_timeout_us,
            min_cm: config.sensor_min_cm,
            max_cm: config.sensor_max_cm,
        }
    }
}

/// Convert a raw echo pulse width into a validated distance.
pub fn distance_from_pulse(width_us: u32, range: &PulseRange) -> Result<f32, SensorError> {
    if width_us == 0 {
        return Err(SensorError::EchoTimeout);
    }
    let cm = width_us as f32 / US_PER_CM;
    if cm < range.min_cm || cm > range.max_cm {
        return Err(SensorError::OutOfRange);
    }
    Ok(cm)
}

/// The driver. Owns the trigger output, echo input, and a µs delay source.
pub struct UltrasonicRanger<Trig, Echo, Delay> {
    trig: Trig,
    echo: Echo,
    delay: Delay,
    range: PulseRange,
}

impl<Trig, Echo, Delay> UltrasonicRanger<Trig, Echo, Delay>
where
    Trig: OutputPin,
    Echo: InputPin,
    Delay: DelayNs,
{
    pub fn new(trig: Trig, echo: Echo, delay: Delay, range: PulseRange) -> Self {
        Self {
            trig,
            echo,
            delay,
            range,
        }
    }

    /// Fire one measurement: trigger pulse, bounded echo wait, conversion.
    pub fn measure(&mut self) -> Result<f32, SensorError> {
        // 10 µs trigger pulse, preceded by a settling low.
        self.trig.set_low().map_err(|_| SensorError::GpioFailed)?;
        self.delay.delay_us(2);
        self.trig.set_high().map_err(|_| SensorError::GpioFailed)?;
        self.delay.delay_us(10);
        self.trig.set_low().map_err(|_| SensorError::GpioFailed)?;

        // Wait for the echo rising edge, capped at the timeout.
        let mut waited_us: u32 = 0;
        while !self.echo.is_high().map_err(|_| SensorError::GpioFailed)? {
            if waited_us >= self.range.echo_timeout_us {
                return Err(SensorError::EchoTimeout);
            }
            self.delay.delay_us(1);
            waited_us += 1;
        }

        // Measure the pulse width with the same cap.
        let mut width_us: u32 = 0;
        while self.echo.is_high().map_err(|_| SensorError::GpioFailed)? {
            if width_us >= self.range.echo_timeout_us {
                return Err(SensorError::EchoTimeout);
            }
            self.delay.delay_us(1);
            width_us += 1;
        }

        distance_from_pulse(width_us, &self.range)
    }
}
