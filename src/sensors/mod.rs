//! Sensor drivers.

pub mod ultrasonic;

pub use ultrasonic::{PulseRange, UltrasonicRanger};
