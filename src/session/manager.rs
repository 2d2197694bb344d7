//! Restore-or-join decision and persist-after-send.
//!
//! ```text
//!  Start ─▶ Restoring ─┬─▶ Resumed ───────────────────────┬─▶ Ready
//!                      └─▶ NeedsJoin ─▶ Joining ─┬─▶ Joined┘
//!                                                └─▶ Failed
//! ```
//!
//! [`SessionManager::establish`] walks this machine once per wake.
//! [`SessionManager::persist`] must only be called after the stack reported
//! a successful uplink; persisting after a failed send would desynchronise
//! the stored frame counter from what the network has seen.

use log::{debug, info, warn};

use super::codec::{CodecError, NONCES_LEN, Part, RECORD_LEN, SessionRecord};
use super::{NAMESPACE, NONCES_KEY, SESSION_KEY};
use crate::app::events::CycleEvent;
use crate::app::ports::{Activation, BlobNamespace, BlobStore, EventSink, RadioPort, StorageError};
use crate::error::{CycleError, Corruption, JoinError, PersistFailure, SessionError};

/// Where the ready session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Persisted session resumed without a join.
    Resumed,
    /// Fresh OTAA join.
    Joined,
}

/// Position in the per-wake session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Start,
    Restoring,
    Resumed,
    NeedsJoin,
    Joining,
    Joined,
    Ready(SessionOrigin),
    Failed,
}

/// Outcome of [`SessionManager::try_restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Resumed,
    NotAvailable(SessionError),
}

/// Outcome of [`SessionManager::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    Skipped(PersistFailure),
}

/// Drives session establishment for a single wake.
#[derive(Debug)]
pub struct SessionManager {
    phase: SessionPhase,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Start,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Try to resume the persisted session.
    ///
    /// Blob lengths are checked before anything is read, and nothing is
    /// handed to the stack unless both blobs have exactly the expected size.
    /// Only [`Activation::SessionRestored`] counts as resumed: a
    /// `NewSession` here means the stack silently started a new negotiation.
    pub fn try_restore(
        &mut self,
        radio: &mut impl RadioPort,
        store: &mut impl BlobStore,
    ) -> RestoreOutcome {
        self.phase = SessionPhase::Restoring;

        let record = match load_record(store) {
            Ok(record) => record,
            Err(e) => return self.not_available(e),
        };

        if let Err(e) = radio.load_nonces(record.nonces()) {
            return self.not_available(SessionError::Corrupt(Corruption::Rejected {
                key: NONCES_KEY,
                code: e.0,
            }));
        }
        if let Err(e) = radio.load_session(record.session()) {
            return self.not_available(SessionError::Corrupt(Corruption::Rejected {
                key: SESSION_KEY,
                code: e.0,
            }));
        }

        match radio.activate() {
            Activation::SessionRestored => {
                info!("Session: resumed persisted session");
                self.phase = SessionPhase::Resumed;
                RestoreOutcome::Resumed
            }
            other => self.not_available(SessionError::Corrupt(Corruption::NotRestored(other))),
        }
    }

    /// Run a fresh OTAA join.  Only [`Activation::NewSession`] is success.
    pub fn join_fresh(&mut self, radio: &mut impl RadioPort) -> Result<(), JoinError> {
        self.phase = SessionPhase::Joining;
        match radio.activate() {
            Activation::NewSession => {
                info!("Session: OTAA join accepted");
                self.phase = SessionPhase::Joined;
                Ok(())
            }
            other => {
                warn!("Session: OTAA join failed ({})", other);
                self.phase = SessionPhase::Failed;
                Err(JoinError(other))
            }
        }
    }

    /// Resume if possible, else join.  Ends in `Ready` or `Failed`.
    pub fn establish(
        &mut self,
        radio: &mut impl RadioPort,
        store: &mut impl BlobStore,
        sink: &mut impl EventSink,
    ) -> Result<SessionOrigin, CycleError> {
        let origin = match self.try_restore(radio, store) {
            RestoreOutcome::Resumed => SessionOrigin::Resumed,
            RestoreOutcome::NotAvailable(reason) => {
                sink.emit(&CycleEvent::RestoreSkipped(reason));
                self.join_fresh(radio)?;
                SessionOrigin::Joined
            }
        };
        self.phase = SessionPhase::Ready(origin);
        sink.emit(&CycleEvent::SessionReady(origin));
        Ok(origin)
    }

    /// Read the stack's current buffers back and write both blobs.
    ///
    /// Best effort: any failure is reported as [`PersistOutcome::Skipped`]
    /// and the in-memory session stays usable for the rest of the wake.
    /// A failed nonce write stops before the session blob is touched.
    pub fn persist(&self, radio: &impl RadioPort, store: &mut impl BlobStore) -> PersistOutcome {
        let record = match SessionRecord::from_parts(radio.nonces(), radio.session()) {
            Ok(record) => record,
            Err(e) => {
                warn!("Session: not persisting, stack buffers invalid: {}", e);
                return PersistOutcome::Skipped(PersistFailure::BadBuffers(e));
            }
        };

        match write_record(store, &record) {
            Ok(()) => {
                debug!("Session: persisted {} bytes", RECORD_LEN);
                PersistOutcome::Saved
            }
            Err(e) => {
                warn!("Session: not persisted: {}", e);
                PersistOutcome::Skipped(PersistFailure::StoreUnavailable(e))
            }
        }
    }

    fn not_available(&mut self, reason: SessionError) -> RestoreOutcome {
        info!("Session: no resumable session ({})", reason);
        self.phase = SessionPhase::NeedsJoin;
        RestoreOutcome::NotAvailable(reason)
    }
}

/// Erase the persisted session so the next wake joins fresh.
pub fn factory_reset(store: &mut impl BlobStore) -> Result<(), StorageError> {
    let mut ns = store.open(NAMESPACE)?;
    ns.clear()?;
    warn!("Session: persisted session erased (factory reset)");
    Ok(())
}

fn load_record(store: &mut impl BlobStore) -> Result<SessionRecord, SessionError> {
    let ns = store
        .open(NAMESPACE)
        .map_err(SessionError::StoreUnavailable)?;

    expect_len(&ns, NONCES_KEY, NONCES_LEN)?;
    expect_len(&ns, SESSION_KEY, RECORD_LEN - NONCES_LEN)?;

    let mut raw = [0u8; RECORD_LEN];
    let (nonces, session) = raw.split_at_mut(NONCES_LEN);
    read_exact(&ns, NONCES_KEY, nonces)?;
    read_exact(&ns, SESSION_KEY, session)?;
    drop(ns);

    SessionRecord::deserialize(&raw).map_err(codec_corruption)
}

fn codec_corruption(e: CodecError) -> SessionError {
    let CodecError::SizeMismatch {
        part,
        expected,
        found,
    } = e;
    let key = match part {
        Part::Nonces => NONCES_KEY,
        Part::Session => SESSION_KEY,
        Part::Record => NAMESPACE,
    };
    SessionError::Corrupt(Corruption::SizeMismatch {
        key,
        expected,
        found,
    })
}

fn expect_len(ns: &impl BlobNamespace, key: &'static str, expected: usize) -> Result<(), SessionError> {
    match ns.blob_len(key) {
        None => Err(SessionError::Absent { key }),
        Some(found) if found != expected => Err(SessionError::Corrupt(Corruption::SizeMismatch {
            key,
            expected,
            found,
        })),
        Some(_) => Ok(()),
    }
}

fn read_exact(ns: &impl BlobNamespace, key: &'static str, buf: &mut [u8]) -> Result<(), SessionError> {
    let expected = buf.len();
    match ns.read(key, buf) {
        Ok(found) if found == expected => Ok(()),
        Ok(found) => Err(SessionError::Corrupt(Corruption::SizeMismatch {
            key,
            expected,
            found,
        })),
        Err(StorageError::NotFound) => Err(SessionError::Absent { key }),
        Err(e) => Err(SessionError::StoreUnavailable(e)),
    }
}

fn write_record(store: &mut impl BlobStore, record: &SessionRecord) -> Result<(), StorageError> {
    let bytes = record.serialize();
    let (nonces, session) = bytes.split_at(NONCES_LEN);
    let mut ns = store.open(NAMESPACE)?;
    ns.write(NONCES_KEY, nonces)?;
    ns.write(SESSION_KEY, session)?;
    Ok(())
}
