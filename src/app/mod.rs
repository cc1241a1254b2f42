//! Application core: port traits, outbound events, the upload gatekeeper,
//! and the activation controller.

pub mod events;
pub mod ports;
pub mod service;
pub mod uplink;
