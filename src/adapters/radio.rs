//! LoRaWAN radio adapter.
//!
//! Implements [`RadioPort`].  On hardware the SX1262 and the LoRaWAN MAC are
//! driven by RadioLib through the `radiolib_shim` ESP-IDF component; this
//! module only declares and calls its C entry points.  The MAC, crypto and
//! buffer contents stay opaque.
//!
//! On non-espidf targets a small in-memory stack stands in for RadioLib.
//! It follows the same activation rules (restore only when both buffers were
//! accepted and belong to the configured device, otherwise join with the
//! next DevNonce) so the session logic can be exercised end to end.

use log::{debug, info, warn};

use crate::app::ports::{Activation, RadioError, RadioPort};
use crate::config::{DeviceIdentity, NodeConfig, Region};
use crate::session::{NONCES_LEN, SESSION_LEN};

/// Stack status codes surfaced by this adapter (RadioLib numbering).
pub mod status {
    pub const ERR_NONE: i16 = 0;
    pub const ERR_UNKNOWN: i16 = -1;
    pub const ERR_PACKET_TOO_LONG: i16 = -4;
    pub const ERR_TX_TIMEOUT: i16 = -5;
    pub const ERR_NETWORK_NOT_JOINED: i16 = -1101;
    pub const ERR_NO_JOIN_ACCEPT: i16 = -1116;
    pub const ERR_NONCES_DISCARDED: i16 = -1118;
    pub const ERR_SESSION_DISCARDED: i16 = -1119;
}

/// Application payload limit at the slowest EU868 data rate.
pub const MAX_PAYLOAD_LEN: usize = 51;

fn region_code(region: Region) -> u8 {
    match region {
        Region::Eu868 => 0,
        Region::Us915 => 1,
        Region::Au915 => 2,
        Region::As923 => 3,
        Region::In865 => 4,
    }
}

// ───────────────────────────────────────────────────────────────
// Hardware backend (RadioLib via radiolib_shim)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod ffi {
    // Activation results of `lw_activate`.
    pub const LW_NEW_SESSION: i16 = 1;
    pub const LW_SESSION_RESTORED: i16 = 2;

    unsafe extern "C" {
        pub fn lw_begin(region: u8, sub_band: u8) -> i16;
        pub fn lw_begin_otaa(
            join_eui: u64,
            dev_eui: u64,
            nwk_key: *const u8,
            app_key: *const u8,
        ) -> i16;
        pub fn lw_set_nonces(buf: *const u8, len: usize) -> i16;
        pub fn lw_set_session(buf: *const u8, len: usize) -> i16;
        pub fn lw_activate() -> i16;
        pub fn lw_nonces() -> *const u8;
        pub fn lw_nonces_len() -> usize;
        pub fn lw_session() -> *const u8;
        pub fn lw_session_len() -> usize;
        pub fn lw_send_receive(payload: *const u8, len: usize) -> i16;
        pub fn lw_random(max: i32) -> i32;
    }
}

/// SX1262 + RadioLib `LoRaWANNode`.  There is exactly one per board; the
/// shim owns the node instance.
#[cfg(target_os = "espidf")]
pub struct LoRaWanRadio {
    _private: (),
}

#[cfg(target_os = "espidf")]
impl LoRaWanRadio {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(target_os = "espidf")]
fn shim_buffer(ptr: *const u8, len: usize) -> &'static [u8] {
    if ptr.is_null() {
        return &[];
    }
    // SAFETY: the shim returns pointers into the node's static buffers,
    // valid for the whole program and `len` bytes long.
    unsafe { core::slice::from_raw_parts(ptr, len) }
}

#[cfg(target_os = "espidf")]
impl RadioPort for LoRaWanRadio {
    fn begin(&mut self, config: &NodeConfig) -> Result<(), RadioError> {
        let st = unsafe { ffi::lw_begin(region_code(config.region), config.sub_band) };
        if st != status::ERR_NONE {
            warn!("Radio: begin failed ({})", st);
            return Err(RadioError(st));
        }
        let (nonces_len, session_len) = unsafe { (ffi::lw_nonces_len(), ffi::lw_session_len()) };
        if nonces_len != NONCES_LEN || session_len != SESSION_LEN {
            warn!(
                "Radio: stack buffers are {}/{} bytes, firmware expects {}/{}",
                nonces_len, session_len, NONCES_LEN, SESSION_LEN
            );
            return Err(RadioError(status::ERR_UNKNOWN));
        }
        info!("Radio: SX1262 up, region {:?} sub-band {}", config.region, config.sub_band);
        Ok(())
    }

    fn begin_otaa(&mut self, identity: &DeviceIdentity) -> Result<(), RadioError> {
        let st = unsafe {
            ffi::lw_begin_otaa(
                identity.join_eui,
                identity.dev_eui,
                identity.nwk_key.as_ptr(),
                identity.app_key.as_ptr(),
            )
        };
        if st != status::ERR_NONE {
            return Err(RadioError(st));
        }
        debug!("Radio: OTAA identity set for {:016X}", identity.dev_eui);
        Ok(())
    }

    fn load_nonces(&mut self, nonces: &[u8]) -> Result<(), RadioError> {
        let st = unsafe { ffi::lw_set_nonces(nonces.as_ptr(), nonces.len()) };
        if st != status::ERR_NONE {
            return Err(RadioError(st));
        }
        Ok(())
    }

    fn load_session(&mut self, session: &[u8]) -> Result<(), RadioError> {
        let st = unsafe { ffi::lw_set_session(session.as_ptr(), session.len()) };
        if st != status::ERR_NONE {
            return Err(RadioError(st));
        }
        Ok(())
    }

    fn activate(&mut self) -> Activation {
        match unsafe { ffi::lw_activate() } {
            ffi::LW_NEW_SESSION => Activation::NewSession,
            ffi::LW_SESSION_RESTORED => Activation::SessionRestored,
            code => Activation::Failed(code),
        }
    }

    fn nonces(&self) -> &[u8] {
        unsafe { shim_buffer(ffi::lw_nonces(), ffi::lw_nonces_len()) }
    }

    fn session(&self) -> &[u8] {
        unsafe { shim_buffer(ffi::lw_session(), ffi::lw_session_len()) }
    }

    fn send_receive(&mut self, payload: &[u8]) -> i16 {
        unsafe { ffi::lw_send_receive(payload.as_ptr(), payload.len()) }
    }

    fn random(&mut self, max: u32) -> u32 {
        let max = i32::try_from(max).unwrap_or(i32::MAX);
        unsafe { ffi::lw_random(max) }.max(0) as u32
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const NONCES_MAGIC: u8 = 0x4E;
#[cfg(not(target_os = "espidf"))]
const SESSION_MAGIC: u8 = 0x53;

/// In-memory LoRaWAN stack.
///
/// Buffer layout (private to the simulation):
///
/// ```text
/// nonces:  [magic 'N'][dev_eui: 8 BE][dev_nonce: 2 BE][pad]
/// session: [magic 'S'][dev_eui: 8 BE][dev_nonce: 2 BE][fcnt_up: 4 BE][pad]
/// ```
#[cfg(not(target_os = "espidf"))]
pub struct LoRaWanRadio {
    started: bool,
    identity: Option<DeviceIdentity>,
    nonces: [u8; NONCES_LEN],
    session: [u8; SESSION_LEN],
    nonces_loaded: bool,
    session_loaded: bool,
    active: bool,
    link_up: bool,
    rng: u32,
}

#[cfg(not(target_os = "espidf"))]
impl Default for LoRaWanRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl LoRaWanRadio {
    pub fn new() -> Self {
        Self {
            started: false,
            identity: None,
            nonces: [0; NONCES_LEN],
            session: [0; SESSION_LEN],
            nonces_loaded: false,
            session_loaded: false,
            active: false,
            link_up: true,
            rng: 0x2545_F491,
        }
    }

    /// Simulate gateway coverage.  With the link down joins and uplinks fail.
    pub fn set_link(&mut self, up: bool) {
        self.link_up = up;
    }

    /// Uplink frame counter of the active session.
    pub fn frame_counter(&self) -> u32 {
        u32::from_be_bytes([self.session[11], self.session[12], self.session[13], self.session[14]])
    }

    /// DevNonce of the last join.
    pub fn dev_nonce(&self) -> u16 {
        u16::from_be_bytes([self.nonces[9], self.nonces[10]])
    }

    fn dev_eui(&self) -> u64 {
        self.identity.as_ref().map_or(0, |id| id.dev_eui)
    }

    fn owned_by_device(&self, buf: &[u8], magic: u8) -> bool {
        let mut eui = [0u8; 8];
        eui.copy_from_slice(&buf[1..9]);
        buf[0] == magic && u64::from_be_bytes(eui) == self.dev_eui()
    }

    fn join(&mut self) -> Activation {
        if !self.link_up {
            warn!("Radio(sim): no JoinAccept");
            return Activation::Failed(status::ERR_NO_JOIN_ACCEPT);
        }
        let dev_nonce = if self.nonces_loaded {
            self.dev_nonce().wrapping_add(1)
        } else {
            1
        };
        let eui = self.dev_eui().to_be_bytes();

        self.nonces = [0; NONCES_LEN];
        self.nonces[0] = NONCES_MAGIC;
        self.nonces[1..9].copy_from_slice(&eui);
        self.nonces[9..11].copy_from_slice(&dev_nonce.to_be_bytes());

        self.session = [0; SESSION_LEN];
        self.session[0] = SESSION_MAGIC;
        self.session[1..9].copy_from_slice(&eui);
        self.session[9..11].copy_from_slice(&dev_nonce.to_be_bytes());

        self.nonces_loaded = true;
        self.active = true;
        info!("Radio(sim): joined with DevNonce {}", dev_nonce);
        Activation::NewSession
    }
}

#[cfg(not(target_os = "espidf"))]
impl RadioPort for LoRaWanRadio {
    fn begin(&mut self, config: &NodeConfig) -> Result<(), RadioError> {
        self.started = true;
        debug!(
            "Radio(sim): begin region={} sub_band={}",
            region_code(config.region),
            config.sub_band
        );
        Ok(())
    }

    fn begin_otaa(&mut self, identity: &DeviceIdentity) -> Result<(), RadioError> {
        if !self.started {
            return Err(RadioError(status::ERR_UNKNOWN));
        }
        self.identity = Some(identity.clone());
        Ok(())
    }

    fn load_nonces(&mut self, nonces: &[u8]) -> Result<(), RadioError> {
        if nonces.len() != NONCES_LEN || !self.owned_by_device(nonces, NONCES_MAGIC) {
            return Err(RadioError(status::ERR_NONCES_DISCARDED));
        }
        self.nonces.copy_from_slice(nonces);
        self.nonces_loaded = true;
        Ok(())
    }

    fn load_session(&mut self, session: &[u8]) -> Result<(), RadioError> {
        if !self.nonces_loaded
            || session.len() != SESSION_LEN
            || !self.owned_by_device(session, SESSION_MAGIC)
            || session[9..11] != self.nonces[9..11]
        {
            return Err(RadioError(status::ERR_SESSION_DISCARDED));
        }
        self.session.copy_from_slice(session);
        self.session_loaded = true;
        Ok(())
    }

    fn activate(&mut self) -> Activation {
        if self.identity.is_none() {
            return Activation::Failed(status::ERR_NETWORK_NOT_JOINED);
        }
        if self.session_loaded && !self.active {
            self.active = true;
            return Activation::SessionRestored;
        }
        self.join()
    }

    fn nonces(&self) -> &[u8] {
        &self.nonces
    }

    fn session(&self) -> &[u8] {
        &self.session
    }

    fn send_receive(&mut self, payload: &[u8]) -> i16 {
        if !self.active {
            return status::ERR_NETWORK_NOT_JOINED;
        }
        if payload.len() > MAX_PAYLOAD_LEN {
            return status::ERR_PACKET_TOO_LONG;
        }
        if !self.link_up {
            return status::ERR_TX_TIMEOUT;
        }
        let fcnt = self.frame_counter().wrapping_add(1);
        self.session[11..15].copy_from_slice(&fcnt.to_be_bytes());
        debug!("Radio(sim): uplink FCntUp={} ({} bytes)", fcnt, payload.len());
        status::ERR_NONE
    }

    fn random(&mut self, max: u32) -> u32 {
        // xorshift32
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        if max == 0 { 0 } else { self.rng % max }
    }
}
