//! LoRaWAN session persistence and resumption.
//!
//! The expensive part of every wake is the OTAA join.  This module decides,
//! once per wake, whether the node can resume the session persisted on the
//! previous wake, and writes the updated session back after every
//! acknowledged uplink so the frame counter stays in step with the network.
//!
//! Persisted layout: namespace [`NAMESPACE`], nonce buffer under
//! [`NONCES_KEY`], session buffer under [`SESSION_KEY`].  Both blobs must be
//! present with exactly [`NONCES_LEN`] / [`SESSION_LEN`] bytes.
//!
//! ## Known risk
//!
//! The two blobs are written as two independent NVS commits.  A power loss
//! between them leaves a fresh nonce buffer next to a stale session buffer.
//! The stack then refuses the pair on the next wake and the node rejoins.

pub mod codec;
pub mod manager;

pub use codec::{CodecError, NONCES_LEN, RECORD_LEN, SESSION_LEN, SessionRecord};
pub use manager::{
    PersistOutcome, RestoreOutcome, SessionManager, SessionOrigin, SessionPhase, factory_reset,
};

/// NVS namespace holding the session record.
pub const NAMESPACE: &str = "lw";
/// Key of the nonce blob.
pub const NONCES_KEY: &str = "n";
/// Key of the session blob.
pub const SESSION_KEY: &str = "s";
