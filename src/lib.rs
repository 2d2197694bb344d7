//! lwnode firmware library.
//!
//! Periodic LoRaWAN sensor node: wake, resume or join, send one uplink,
//! persist the session, sleep.  The domain core and every adapter are
//! exposed here so host tests can drive a full wake cycle.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod payload;
pub mod pins;
pub mod sensors;
pub mod session;
pub mod ui;
