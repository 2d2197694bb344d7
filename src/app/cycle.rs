//! One wake, start to sleep.
//!
//! ```text
//!  Woke ─▶ rails up ─▶ banner ─▶ radio ─▶ session ─▶ measure ─▶ uplink ─▶ persist
//!                                  │         │                     │
//!                                  └─────────┴──── Err ────────────┤
//!                                                                  ▼
//!                                                   status screen ─▶ finish ─▶ deep sleep
//! ```
//!
//! A single linear pass: no loop and no retry inside a wake.  Every failure
//! short-circuits to the status screen and the node sleeps; the next timer
//! wake is the retry.  [`WakeCycle::run`] never sleeps itself, so a caller
//! (or a test) sees the full [`CycleReport`] before [`WakeCycle::finish`]
//! hands control to the board.

use log::{debug, info};

use super::events::CycleEvent;
use super::ports::{BlobStore, BoardPort, DisplayPort, EventSink, RadioPort, RetainedMemory};
use crate::config::{DeviceIdentity, NodeConfig};
use crate::error::{CycleError, InitError, SendError};
use crate::payload::UplinkPayload;
use crate::sensors::SensorReading;
use crate::session::{PersistOutcome, SessionManager, SessionOrigin, SessionPhase};
use crate::ui::Screen;

/// Upper bound (exclusive) of the first payload byte.
const SAMPLE_RANGE: u32 = 100;
/// Upper bound (exclusive) of the 16-bit payload value.
const VALUE_RANGE: u32 = 2000;

/// A successful uplink and what happened around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uplink {
    pub origin: SessionOrigin,
    pub payload: UplinkPayload,
    /// Non-negative stack status from `send_receive`.
    pub status: i16,
    pub persist: PersistOutcome,
}

/// Result of [`WakeCycle::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// 1-based wake number since the last power-on.
    pub cycle: u32,
    /// `None` when the pass failed before a session was ready.
    pub reading: Option<SensorReading>,
    pub result: Result<Uplink, CycleError>,
}

impl CycleReport {
    pub fn sent(&self) -> bool {
        self.result.is_ok()
    }
}

// ───────────────────────────────────────────────────────────────
// WakeCycle
// ───────────────────────────────────────────────────────────────

pub struct WakeCycle {
    config: NodeConfig,
    identity: DeviceIdentity,
    cycle: u32,
    session: SessionManager,
    reading: Option<SensorReading>,
}

impl WakeCycle {
    /// `wake_count` is the value left in retained memory by the previous
    /// wake (0 after power loss).  This wake is `wake_count + 1`, wrapping.
    pub fn new(config: NodeConfig, identity: DeviceIdentity, wake_count: u32) -> Self {
        Self {
            config,
            identity,
            cycle: wake_count.wrapping_add(1),
            session: SessionManager::new(),
            reading: None,
        }
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn session_phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Run the pass up to (not including) deep sleep.
    pub fn run<R, S, H, E>(
        &mut self,
        radio: &mut R,
        store: &mut S,
        hw: &mut H,
        sink: &mut E,
    ) -> CycleReport
    where
        R: RadioPort,
        S: BlobStore,
        H: BoardPort + DisplayPort,
        E: EventSink,
    {
        sink.emit(&CycleEvent::Woke { cycle: self.cycle });

        hw.power_up();
        hw.show(&Screen::Banner { cycle: self.cycle });
        hw.delay_ms(self.config.banner_hold_ms);

        let result = self.transmit(radio, store, hw, sink);
        if let Err(e) = result {
            sink.emit(&CycleEvent::Failed(e));
        }

        let sent = result.is_ok();
        hw.show(&Screen::Status {
            sent,
            reading: self.reading,
            cycle: self.cycle,
            sleep_secs: self.config.sleep_secs,
        });
        hw.delay_ms(self.config.status_hold_ms);

        sink.emit(&CycleEvent::Finished {
            cycle: self.cycle,
            success: sent,
        });

        CycleReport {
            cycle: self.cycle,
            reading: self.reading,
            result,
        }
    }

    /// Record the wake counter and sleep.  The chip resets on wake.
    pub fn finish(self, hw: &mut impl BoardPort, retained: &mut impl RetainedMemory) -> ! {
        retained.store_wake_count(self.cycle);
        info!(
            "Cycle {}: sleeping {} s",
            self.cycle, self.config.sleep_secs
        );
        hw.deep_sleep(self.config.sleep_secs)
    }

    // ── Pipeline ──────────────────────────────────────────────

    fn transmit<R, S, H, E>(
        &mut self,
        radio: &mut R,
        store: &mut S,
        hw: &mut H,
        sink: &mut E,
    ) -> Result<Uplink, CycleError>
    where
        R: RadioPort,
        S: BlobStore,
        H: BoardPort,
        E: EventSink,
    {
        self.start_radio(radio)?;
        sink.emit(&CycleEvent::RadioReady);

        let origin = self.session.establish(radio, store, sink)?;

        let reading = SensorReading::new(hw.battery_millivolts(), hw.chip_temperature_c());
        self.reading = Some(reading);
        debug!(
            "Cycle {}: battery {} mV ({}%), chip {:.1} C",
            self.cycle, reading.battery_mv, reading.battery_percent, reading.chip_temp_c
        );

        let payload = UplinkPayload {
            sample: radio.random(SAMPLE_RANGE).min(SAMPLE_RANGE - 1) as u8,
            value: radio.random(VALUE_RANGE).min(VALUE_RANGE - 1) as u16,
            battery_mv: reading.battery_mv,
        };

        let status = radio.send_receive(&payload.to_bytes());
        if status < 0 {
            return Err(SendError(status).into());
        }
        sink.emit(&CycleEvent::UplinkSent { status, payload });

        // Only after the stack acknowledged the uplink.
        let persist = self.session.persist(radio, store);
        match persist {
            PersistOutcome::Saved => sink.emit(&CycleEvent::SessionSaved),
            PersistOutcome::Skipped(reason) => sink.emit(&CycleEvent::SessionNotSaved(reason)),
        }

        Ok(Uplink {
            origin,
            payload,
            status,
            persist,
        })
    }

    fn start_radio(&self, radio: &mut impl RadioPort) -> Result<(), InitError> {
        radio.begin(&self.config).map_err(InitError::Radio)?;
        if !self.identity.is_provisioned() {
            return Err(InitError::Unprovisioned);
        }
        radio
            .begin_otaa(&self.identity)
            .map_err(InitError::Identity)
    }
}
