//! Fuzz target: persisted session record
//!
//! Treats the input as whatever flash handed back for keys `"n"` and `"s"`
//! and drives the restore path.  Verifies:
//! - No panics for any blob contents or lengths
//! - Blobs that are not exactly the expected sizes never reach the stack
//! - A record that does reach the stack survives a persist unchanged
//!
//! cargo fuzz run fuzz_session_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use lwnode::adapters::nvs::NvsAdapter;
use lwnode::app::ports::{
    Activation, BlobNamespace, BlobStore, RadioError, RadioPort,
};
use lwnode::config::{DeviceIdentity, NodeConfig};
use lwnode::session::{
    NAMESPACE, NONCES_KEY, NONCES_LEN, PersistOutcome, RestoreOutcome, SESSION_KEY, SESSION_LEN,
    SessionManager, SessionRecord,
};

// ── Echo stack: accepts whatever it is given ──────────────────

struct EchoRadio {
    nonces: Vec<u8>,
    session: Vec<u8>,
    loads: usize,
}

impl RadioPort for EchoRadio {
    fn begin(&mut self, _: &NodeConfig) -> Result<(), RadioError> {
        Ok(())
    }
    fn begin_otaa(&mut self, _: &DeviceIdentity) -> Result<(), RadioError> {
        Ok(())
    }
    fn load_nonces(&mut self, n: &[u8]) -> Result<(), RadioError> {
        self.loads += 1;
        self.nonces = n.to_vec();
        Ok(())
    }
    fn load_session(&mut self, s: &[u8]) -> Result<(), RadioError> {
        self.loads += 1;
        self.session = s.to_vec();
        Ok(())
    }
    fn activate(&mut self) -> Activation {
        Activation::SessionRestored
    }
    fn nonces(&self) -> &[u8] {
        &self.nonces
    }
    fn session(&self) -> &[u8] {
        &self.session
    }
    fn send_receive(&mut self, _: &[u8]) -> i16 {
        0
    }
    fn random(&mut self, _: u32) -> u32 {
        0
    }
}

fuzz_target!(|data: &[u8]| {
    // First byte picks the split between the two blobs.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let cut = (usize::from(split) * rest.len()) / 255;
    let (nonces, session) = rest.split_at(cut.min(rest.len()));

    let _ = SessionRecord::deserialize(rest);

    let mut store = match NvsAdapter::new() {
        Ok(s) => s,
        Err(_) => return,
    };
    {
        let mut ns = store.open(NAMESPACE).unwrap();
        ns.write(NONCES_KEY, nonces).unwrap();
        ns.write(SESSION_KEY, session).unwrap();
    }

    let mut radio = EchoRadio {
        nonces: Vec::new(),
        session: Vec::new(),
        loads: 0,
    };
    let mut mgr = SessionManager::new();
    let outcome = mgr.try_restore(&mut radio, &mut store);

    let exact = nonces.len() == NONCES_LEN && session.len() == SESSION_LEN;
    assert_eq!(outcome == RestoreOutcome::Resumed, exact);
    if !exact {
        assert_eq!(radio.loads, 0);
        return;
    }

    assert_eq!(mgr.persist(&radio, &mut store), PersistOutcome::Saved);
    let ns = store.open(NAMESPACE).unwrap();
    let mut n = [0u8; NONCES_LEN];
    let mut s = [0u8; SESSION_LEN];
    assert_eq!(ns.read(NONCES_KEY, &mut n), Ok(NONCES_LEN));
    assert_eq!(ns.read(SESSION_KEY, &mut s), Ok(SESSION_LEN));
    assert_eq!(&n[..], nonces);
    assert_eq!(&s[..], session);
});
