//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WakeCycle / SessionManager (domain)
//! ```
//!
//! Driven adapters (radio, persistent store, board, display, event sinks)
//! implement these traits.  The [`WakeCycle`](super::cycle::WakeCycle) and
//! [`SessionManager`](crate::session::SessionManager) consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! ## Persistence notes
//!
//! - **BlobStore** writes are committed per key.  Two writes are two
//!   independent commits; there is no multi-key transaction.
//! - Namespace handles close on drop, so every exit path releases them.

use crate::config::{DeviceIdentity, NodeConfig};
use crate::ui::Screen;

// ───────────────────────────────────────────────────────────────
// Blob store port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Longest namespace or key name the store accepts (NVS limit).
pub const MAX_NAME_LEN: usize = 15;

/// Namespaced persistent key → byte-blob storage.
pub trait BlobStore {
    /// Open handle onto one namespace.  Closed when dropped.
    type Namespace<'a>: BlobNamespace
    where
        Self: 'a;

    /// Open `namespace` for reading and writing.
    fn open(&mut self, namespace: &str) -> Result<Self::Namespace<'_>, StorageError>;
}

/// Operations on an opened namespace.
pub trait BlobNamespace {
    /// Stored length of `key`, or `None` if it does not exist.
    fn blob_len(&self, key: &str) -> Option<usize>;

    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write and commit a value.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    /// Erase every key in the namespace.
    fn clear(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists node configuration.
///
/// Implementations MUST validate before persisting.  Out-of-range values
/// are rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`NodeConfig::default()`] if no stored config exists.
    fn load(&mut self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ LoRaWAN stack)
// ───────────────────────────────────────────────────────────────

/// Result of asking the LoRaWAN stack to activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The stack negotiated a brand-new session (OTAA join accepted).
    NewSession,
    /// The stack accepted the previously loaded session buffers.
    SessionRestored,
    /// Activation failed with a stack-specific status code.
    Failed(i16),
}

/// Opaque LoRaWAN capability provider.
///
/// The stack owns its nonce and session buffers and mutates them on every
/// send (frame counters, key rotation).  The domain only loads them before
/// activation and reads them back after a successful send.
pub trait RadioPort {
    /// Bring up the transceiver and apply the regional channel plan.
    fn begin(&mut self, config: &NodeConfig) -> Result<(), RadioError>;

    /// Set join/device EUIs and root keys for OTAA.
    fn begin_otaa(&mut self, identity: &DeviceIdentity) -> Result<(), RadioError>;

    /// Load persisted nonce buffer.  Rejected buffers return `Err`.
    fn load_nonces(&mut self, nonces: &[u8]) -> Result<(), RadioError>;

    /// Load persisted session buffer.  Rejected buffers return `Err`.
    fn load_session(&mut self, session: &[u8]) -> Result<(), RadioError>;

    /// Activate: resume the loaded session if possible, else join.
    fn activate(&mut self) -> Activation;

    /// Current nonce buffer as held by the stack.
    fn nonces(&self) -> &[u8];

    /// Current session buffer as held by the stack.
    fn session(&self) -> &[u8];

    /// Blocking uplink plus receive windows.  `>= 0` means success.
    fn send_receive(&mut self, payload: &[u8]) -> i16;

    /// Random number in `0..max` from the transceiver's noise source.
    fn random(&mut self, max: u32) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Board port (driven adapter: domain → power rails, sensors, sleep)
// ───────────────────────────────────────────────────────────────

/// Board-level I/O the wake cycle needs.
pub trait BoardPort {
    /// Switch on VEXT, release the OLED reset and enable the battery divider.
    fn power_up(&mut self);

    /// Averaged, divider-corrected battery voltage.
    fn battery_millivolts(&mut self) -> u16;

    /// Calibrated on-die temperature.
    fn chip_temperature_c(&mut self) -> f32;

    /// Blocking delay.
    fn delay_ms(&mut self, ms: u32);

    /// Power down every rail and enter timed deep sleep.  Never returns:
    /// the chip resets on wake.
    fn deep_sleep(&mut self, secs: u32) -> !;
}

/// Presentation-only display output.
pub trait DisplayPort {
    fn show(&mut self, screen: &Screen);
}

// ───────────────────────────────────────────────────────────────
// Retained memory port (survives deep sleep, not power loss)
// ───────────────────────────────────────────────────────────────

pub trait RetainedMemory {
    fn load_wake_count(&self) -> u32;
    fn store_wake_count(&mut self, count: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`CycleEvent`](super::events::CycleEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CycleEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`BlobStore`] / [`BlobNamespace`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Namespace or key longer than [`MAX_NAME_LEN`].
    InvalidName,
    /// Generic I/O error, carrying the backend status code.
    IoError(i32),
}

/// Non-success status reported by the LoRaWAN stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioError(pub i16);

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::InvalidName => write!(f, "name longer than {} bytes", MAX_NAME_LEN),
            Self::IoError(rc) => write!(f, "I/O error (rc={})", rc),
        }
    }
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "radio status {}", self.0)
    }
}

impl core::fmt::Display for Activation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NewSession => write!(f, "new session"),
            Self::SessionRestored => write!(f, "session restored"),
            Self::Failed(code) => write!(f, "activation failed ({})", code),
        }
    }
}
