//! GPIO pin assignments for the MotionSentry board (XIAO ESP32-C3).
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

/// HC-SR04 trigger line (D0 on the XIAO ESP32-C3).
pub const ULTRASONIC_TRIG_GPIO: i32 = 2;

/// HC-SR04 echo line (D1 on the XIAO ESP32-C3).
/// 5 V echo output must go through a divider before this pin.
pub const ULTRASONIC_ECHO_GPIO: i32 = 3;
