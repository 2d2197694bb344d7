//! Error types for the wake cycle.
//!
//! Two families:
//!
//! - [`CycleError`] ends the current wake pass early.  Nothing is escalated
//!   past the pass: the controller shows a failure status and sleeps, and the
//!   next timer wake is the retry.
//! - [`SessionError`] and [`PersistFailure`] are non-fatal.  A session that
//!   cannot be restored falls through to a fresh join; a session that cannot
//!   be saved is simply not saved.
//!
//! All variants are `Copy` so they can be carried in events and reports
//! without allocation.

use core::fmt;

use crate::app::ports::{Activation, RadioError, StorageError};
use crate::session::codec::CodecError;

// ---------------------------------------------------------------------------
// Fatal-for-this-cycle errors
// ---------------------------------------------------------------------------

/// Every failure that short-circuits a wake pass funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError {
    /// Radio or identity initialisation failed.
    Init(InitError),
    /// No session could be restored and the OTAA join failed.
    Join(JoinError),
    /// The uplink was not acknowledged by the stack.
    Send(SendError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Join(e) => write!(f, "join: {e}"),
            Self::Send(e) => write!(f, "send: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// Transceiver bring-up failed.
    Radio(RadioError),
    /// Build carries no usable keys.
    Unprovisioned,
    /// The stack refused the join/device identifiers or keys.
    Identity(RadioError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio(e) => write!(f, "radio begin failed ({e})"),
            Self::Unprovisioned => write!(f, "device identity not provisioned"),
            Self::Identity(e) => write!(f, "OTAA identity rejected ({e})"),
        }
    }
}

impl From<InitError> for CycleError {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

/// A join is only successful when the stack reports [`Activation::NewSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinError(pub Activation);

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected new session, got {}", self.0)
    }
}

impl From<JoinError> for CycleError {
    fn from(e: JoinError) -> Self {
        Self::Join(e)
    }
}

/// Negative status returned by `send_receive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError(pub i16);

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uplink failed (status {})", self.0)
    }
}

impl From<SendError> for CycleError {
    fn from(e: SendError) -> Self {
        Self::Send(e)
    }
}

// ---------------------------------------------------------------------------
// Non-fatal session errors
// ---------------------------------------------------------------------------

/// Why a persisted session could not be resumed.
///
/// Every variant is handled the same way: the record is never partially
/// trusted and the cycle falls through to a fresh join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The store could not be opened or read.
    StoreUnavailable(StorageError),
    /// One of the two keys has never been written.
    Absent { key: &'static str },
    /// The record exists but cannot be used.
    Corrupt(Corruption),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// A stored blob does not have the expected fixed length.
    SizeMismatch {
        key: &'static str,
        expected: usize,
        found: usize,
    },
    /// The stack refused a loaded buffer.
    Rejected { key: &'static str, code: i16 },
    /// The stack activated, but did not resume the loaded session.
    NotRestored(Activation),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable(e) => write!(f, "store unavailable: {e}"),
            Self::Absent { key } => write!(f, "no stored blob '{key}'"),
            Self::Corrupt(c) => write!(f, "corrupt session: {c}"),
        }
    }
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                key,
                expected,
                found,
            } => write!(f, "'{key}' is {found} bytes, expected {expected}"),
            Self::Rejected { key, code } => write!(f, "stack rejected '{key}' ({code})"),
            Self::NotRestored(a) => write!(f, "stack reported {a}"),
        }
    }
}

/// Why post-send persistence was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistFailure {
    /// Store could not be opened or a write failed.
    StoreUnavailable(StorageError),
    /// The stack handed back buffers of the wrong size.
    BadBuffers(CodecError),
}

impl fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable(e) => write!(f, "store unavailable: {e}"),
            Self::BadBuffers(e) => write!(f, "stack buffers invalid: {e}"),
        }
    }
}
