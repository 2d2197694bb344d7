//! Fixed-size binary form of the LoRaWAN session state.
//!
//! The stack exposes two opaque buffers: the nonce buffer (join counters,
//! anti-replay state) and the session buffer (keys, frame counters,
//! negotiated MAC parameters).  A [`SessionRecord`] can only be built from
//! buffers of exactly the expected lengths.  A length mismatch is
//! corruption, never a partial-recovery opportunity.
//!
//! Serialized layout (`RECORD_LEN` bytes):
//!
//! ```text
//! 0               NONCES_LEN                              RECORD_LEN
//! ├── nonces ─────┼── session ─────────────────────────────┤
//! ```

use core::fmt;

/// Length of the stack's nonce buffer.
pub const NONCES_LEN: usize = 16;
/// Length of the stack's session buffer.
pub const SESSION_LEN: usize = 256;
/// Length of a serialized record.
pub const RECORD_LEN: usize = NONCES_LEN + SESSION_LEN;

/// Which part of the record had the wrong size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Nonces,
    Session,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    SizeMismatch {
        part: Part,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                part,
                expected,
                found,
            } => write!(f, "{part:?} is {found} bytes, expected {expected}"),
        }
    }
}

/// The (nonces, session) pair with guaranteed exact lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    nonces: [u8; NONCES_LEN],
    session: [u8; SESSION_LEN],
}

impl SessionRecord {
    /// Build a record from two separately held buffers.
    pub fn from_parts(nonces: &[u8], session: &[u8]) -> Result<Self, CodecError> {
        let nonces: [u8; NONCES_LEN] = nonces.try_into().map_err(|_| CodecError::SizeMismatch {
            part: Part::Nonces,
            expected: NONCES_LEN,
            found: nonces.len(),
        })?;
        let session: [u8; SESSION_LEN] =
            session.try_into().map_err(|_| CodecError::SizeMismatch {
                part: Part::Session,
                expected: SESSION_LEN,
                found: session.len(),
            })?;
        Ok(Self { nonces, session })
    }

    pub fn nonces(&self) -> &[u8; NONCES_LEN] {
        &self.nonces
    }

    pub fn session(&self) -> &[u8; SESSION_LEN] {
        &self.session
    }

    /// Concatenate nonces and session into the fixed record layout.
    pub fn serialize(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[..NONCES_LEN].copy_from_slice(&self.nonces);
        out[NONCES_LEN..].copy_from_slice(&self.session);
        out
    }

    /// Split a serialized record.  `bytes` must be exactly `RECORD_LEN` long.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != RECORD_LEN {
            return Err(CodecError::SizeMismatch {
                part: Part::Record,
                expected: RECORD_LEN,
                found: bytes.len(),
            });
        }
        let (nonces, session) = bytes.split_at(NONCES_LEN);
        Self::from_parts(nonces, session)
    }
}
