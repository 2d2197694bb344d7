//! Mock adapters for integration tests.
//!
//! Each mock records every call it receives so tests can assert on the
//! full history (which buffers were loaded, how often the store was opened,
//! whether a join happened) without a radio or flash.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use lwnode::app::events::CycleEvent;
use lwnode::app::ports::{
    Activation, BlobNamespace, BlobStore, BoardPort, DisplayPort, EventSink, RadioError,
    RadioPort, RetainedMemory, StorageError,
};
use lwnode::config::{DeviceIdentity, NodeConfig};
use lwnode::session::{NAMESPACE, NONCES_KEY, NONCES_LEN, SESSION_KEY, SESSION_LEN};
use lwnode::ui::Screen;

pub fn identity() -> DeviceIdentity {
    DeviceIdentity::new(
        0x70B3_D57E_D000_0000,
        0x0004_A30B_001C_0530,
        [0x2B; 16],
        [0x7E; 16],
    )
}

// ── Radio ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Begin,
    BeginOtaa,
    LoadNonces(Vec<u8>),
    LoadSession(Vec<u8>),
    Activate,
    Send(Vec<u8>),
    Random(u32),
}

/// Scripted LoRaWAN stack.
///
/// `activate` pops from `activations` when scripted, otherwise it restores
/// whenever a session buffer was accepted and joins otherwise.  A join
/// fills both buffers with `join_fill`; every successful send bumps the
/// last session byte, standing in for the frame counter.
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    pub begin_status: Option<i16>,
    pub otaa_status: Option<i16>,
    pub reject_nonces: Option<i16>,
    pub reject_session: Option<i16>,
    pub activations: VecDeque<Activation>,
    pub send_status: i16,
    pub randoms: VecDeque<u32>,
    pub nonces: Vec<u8>,
    pub session: Vec<u8>,
    pub join_fill: u8,
    session_loaded: bool,
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            begin_status: None,
            otaa_status: None,
            reject_nonces: None,
            reject_session: None,
            activations: VecDeque::new(),
            send_status: 0,
            randoms: VecDeque::new(),
            nonces: vec![0; NONCES_LEN],
            session: vec![0; SESSION_LEN],
            join_fill: 0xA5,
            session_loaded: false,
        }
    }

    pub fn count(&self, call: fn(&RadioCall) -> bool) -> usize {
        self.calls.iter().filter(|c| call(c)).count()
    }

    pub fn activations_seen(&self) -> usize {
        self.count(|c| matches!(c, RadioCall::Activate))
    }

    pub fn loaded_anything(&self) -> bool {
        self.calls
            .iter()
            .any(|c| matches!(c, RadioCall::LoadNonces(_) | RadioCall::LoadSession(_)))
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Send(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn frame_counter(&self) -> u8 {
        self.session[SESSION_LEN - 1]
    }

    fn join(&mut self) -> Activation {
        self.nonces = vec![self.join_fill; NONCES_LEN];
        self.session = vec![self.join_fill; SESSION_LEN];
        self.session[SESSION_LEN - 1] = 0;
        self.session_loaded = false;
        Activation::NewSession
    }
}

impl RadioPort for MockRadio {
    fn begin(&mut self, _config: &NodeConfig) -> Result<(), RadioError> {
        self.calls.push(RadioCall::Begin);
        self.begin_status.map_or(Ok(()), |st| Err(RadioError(st)))
    }

    fn begin_otaa(&mut self, _identity: &DeviceIdentity) -> Result<(), RadioError> {
        self.calls.push(RadioCall::BeginOtaa);
        self.otaa_status.map_or(Ok(()), |st| Err(RadioError(st)))
    }

    fn load_nonces(&mut self, nonces: &[u8]) -> Result<(), RadioError> {
        self.calls.push(RadioCall::LoadNonces(nonces.to_vec()));
        if let Some(st) = self.reject_nonces {
            return Err(RadioError(st));
        }
        self.nonces = nonces.to_vec();
        Ok(())
    }

    fn load_session(&mut self, session: &[u8]) -> Result<(), RadioError> {
        self.calls.push(RadioCall::LoadSession(session.to_vec()));
        if let Some(st) = self.reject_session {
            return Err(RadioError(st));
        }
        self.session = session.to_vec();
        self.session_loaded = true;
        Ok(())
    }

    fn activate(&mut self) -> Activation {
        self.calls.push(RadioCall::Activate);
        match self.activations.pop_front() {
            Some(Activation::NewSession) => self.join(),
            Some(other) => other,
            None if self.session_loaded => {
                self.session_loaded = false;
                Activation::SessionRestored
            }
            None => self.join(),
        }
    }

    fn nonces(&self) -> &[u8] {
        &self.nonces
    }

    fn session(&self) -> &[u8] {
        &self.session
    }

    fn send_receive(&mut self, payload: &[u8]) -> i16 {
        self.calls.push(RadioCall::Send(payload.to_vec()));
        if self.send_status >= 0 {
            let last = SESSION_LEN - 1;
            self.session[last] = self.session[last].wrapping_add(1);
        }
        self.send_status
    }

    fn random(&mut self, max: u32) -> u32 {
        self.calls.push(RadioCall::Random(max));
        self.randoms.pop_front().unwrap_or(0)
    }
}

// ── Store ─────────────────────────────────────────────────────

/// In-memory blob store with failure switches and handle accounting.
#[derive(Default)]
pub struct MockStore {
    pub data: HashMap<(String, String), Vec<u8>>,
    pub fail_open: bool,
    /// Writes to this key fail with `IoError`.
    pub fail_write: Option<&'static str>,
    pub opens: usize,
    pub closes: usize,
    pub writes: Vec<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a session record.
    pub fn with_record(nonces: &[u8], session: &[u8]) -> Self {
        let mut store = Self::new();
        store.put(NONCES_KEY, nonces);
        store.put(SESSION_KEY, session);
        store
    }

    pub fn put(&mut self, key: &str, value: &[u8]) {
        self.data
            .insert((NAMESPACE.to_string(), key.to_string()), value.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<&Vec<u8>> {
        self.data.get(&(NAMESPACE.to_string(), key.to_string()))
    }

    pub fn handles_balanced(&self) -> bool {
        self.opens == self.closes
    }
}

pub struct MockNamespace<'a> {
    namespace: String,
    store: &'a mut MockStore,
}

impl BlobStore for MockStore {
    type Namespace<'a> = MockNamespace<'a>;

    fn open(&mut self, namespace: &str) -> Result<MockNamespace<'_>, StorageError> {
        if self.fail_open {
            return Err(StorageError::IoError(-1));
        }
        self.opens += 1;
        Ok(MockNamespace {
            namespace: namespace.to_string(),
            store: self,
        })
    }
}

impl MockNamespace<'_> {
    fn key(&self, key: &str) -> (String, String) {
        (self.namespace.clone(), key.to_string())
    }
}

impl BlobNamespace for MockNamespace<'_> {
    fn blob_len(&self, key: &str) -> Option<usize> {
        self.store.data.get(&self.key(key)).map(Vec::len)
    }

    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .store
            .data
            .get(&self.key(key))
            .ok_or(StorageError::NotFound)?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.store.fail_write == Some(key) {
            return Err(StorageError::IoError(-2));
        }
        let k = self.key(key);
        self.store.writes.push(key.to_string());
        self.store.data.insert(k, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let k = self.key(key);
        self.store.data.remove(&k);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let ns = self.namespace.clone();
        self.store.data.retain(|(n, _), _| *n != ns);
        Ok(())
    }
}

impl Drop for MockNamespace<'_> {
    fn drop(&mut self) {
        self.store.closes += 1;
    }
}

// ── Board + display ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    PowerUp,
    Battery,
    Temperature,
    Delay(u32),
    Show(Screen),
    Sleep(u32),
}

pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub battery_mv: u16,
    pub chip_temp_c: f32,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            battery_mv: 3980,
            chip_temp_c: 28.6,
        }
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Show(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn measured(&self) -> bool {
        self.calls.contains(&BoardCall::Battery)
    }
}

impl BoardPort for MockBoard {
    fn power_up(&mut self) {
        self.calls.push(BoardCall::PowerUp);
    }

    fn battery_millivolts(&mut self) -> u16 {
        self.calls.push(BoardCall::Battery);
        self.battery_mv
    }

    fn chip_temperature_c(&mut self) -> f32 {
        self.calls.push(BoardCall::Temperature);
        self.chip_temp_c
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(BoardCall::Delay(ms));
    }

    fn deep_sleep(&mut self, secs: u32) -> ! {
        self.calls.push(BoardCall::Sleep(secs));
        panic!("deep sleep for {} s", secs);
    }
}

impl DisplayPort for MockBoard {
    fn show(&mut self, screen: &Screen) {
        self.calls.push(BoardCall::Show(*screen));
    }
}

// ── Retained memory ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockRetained {
    pub wake_count: u32,
}

impl RetainedMemory for MockRetained {
    fn load_wake_count(&self) -> u32 {
        self.wake_count
    }

    fn store_wake_count(&mut self, count: u32) {
        self.wake_count = count;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<CycleEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &CycleEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CycleEvent) {
        self.events.push(*event);
    }
}
