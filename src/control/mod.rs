//! Pure decision logic: candidate detection, confirmation debounce, and
//! baseline maintenance. No I/O — the controller feeds these from ports.

pub mod baseline;
pub mod motion;
