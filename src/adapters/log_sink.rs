//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one tagged line per wake-cycle event
//! to the ESP-IDF logger (UART / USB-CDC).

use log::{info, warn};

use crate::app::events::CycleEvent;
use crate::app::ports::EventSink;
use crate::session::SessionOrigin;

/// Adapter that logs every [`CycleEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CycleEvent) {
        match event {
            CycleEvent::Woke { cycle } => {
                info!("WAKE | cycle={}", cycle);
            }
            CycleEvent::RadioReady => {
                info!("RADIO | ready");
            }
            CycleEvent::RestoreSkipped(reason) => {
                info!("SESSION | restore skipped: {}", reason);
            }
            CycleEvent::SessionReady(origin) => {
                let how = match origin {
                    SessionOrigin::Resumed => "resumed",
                    SessionOrigin::Joined => "joined",
                };
                info!("SESSION | ready ({})", how);
            }
            CycleEvent::UplinkSent { status, payload } => {
                info!(
                    "UPLINK | status={} | sample={} value={} batt={}mV",
                    status, payload.sample, payload.value, payload.battery_mv
                );
            }
            CycleEvent::SessionSaved => {
                info!("SESSION | saved");
            }
            CycleEvent::SessionNotSaved(reason) => {
                warn!("SESSION | not saved: {}", reason);
            }
            CycleEvent::Failed(e) => {
                warn!("CYCLE | failed: {}", e);
            }
            CycleEvent::Finished { cycle, success } => {
                info!(
                    "SLEEP | cycle={} | {}",
                    cycle,
                    if *success { "ok" } else { "fail" }
                );
            }
        }
    }
}
