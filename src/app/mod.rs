//! Application core — the wake cycle and its ports.
//!
//! Everything that decides *what* the node does on a wake lives here:
//! the [`cycle::WakeCycle`] pipeline, the events it emits and the port
//! traits it is written against.  Hardware is only reached through
//! [`ports`], so the whole pass runs under test with mock adapters.

pub mod cycle;
pub mod events;
pub mod ports;
