//! Outbound wake-cycle events.
//!
//! The [`WakeCycle`](super::cycle::WakeCycle) and
//! [`SessionManager`](crate::session::SessionManager) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them — log to serial, count them in a test, etc.

use crate::error::{CycleError, PersistFailure, SessionError};
use crate::payload::UplinkPayload;
use crate::session::SessionOrigin;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleEvent {
    /// A wake pass started.
    Woke { cycle: u32 },

    /// Transceiver and OTAA identity accepted by the stack.
    RadioReady,

    /// A persisted session could not be resumed; a join follows.
    RestoreSkipped(SessionError),

    /// A session is ready for transmission.
    SessionReady(SessionOrigin),

    /// The uplink was acknowledged by the stack.
    UplinkSent { status: i16, payload: UplinkPayload },

    /// Post-send session state was written to the store.
    SessionSaved,

    /// Post-send session state could not be written.
    SessionNotSaved(PersistFailure),

    /// The pass was cut short.
    Failed(CycleError),

    /// The pass finished and the node is about to sleep.
    Finished { cycle: u32, success: bool },
}
