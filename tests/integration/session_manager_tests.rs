//! SessionManager against scripted radio and store mocks.
//!
//! Covers the restore-or-join decision for every way a persisted record can
//! be missing or unusable, and the persist-after-send write path.

use lwnode::app::events::CycleEvent;
use lwnode::app::ports::{Activation, RadioPort, StorageError};
use lwnode::error::{Corruption, CycleError, JoinError, PersistFailure, SessionError};
use lwnode::session::{
    self, CodecError, NONCES_KEY, NONCES_LEN, PersistOutcome, RestoreOutcome, SESSION_KEY,
    SESSION_LEN, SessionManager, SessionOrigin, SessionPhase,
};

use crate::mock_hw::{MockRadio, MockStore, RadioCall, RecordingSink};

fn stored_record() -> MockStore {
    MockStore::with_record(&[0x11; NONCES_LEN], &[0x22; SESSION_LEN])
}

// ── Restore ───────────────────────────────────────────────────

#[test]
fn empty_store_is_not_available_without_loading() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();

    let outcome = mgr.try_restore(&mut radio, &mut store);

    assert_eq!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Absent { key: NONCES_KEY })
    );
    assert!(!radio.loaded_anything());
    assert_eq!(radio.activations_seen(), 0);
    assert_eq!(mgr.phase(), SessionPhase::NeedsJoin);
    assert!(store.handles_balanced());
}

#[test]
fn valid_record_resumes_with_both_buffers_in_order() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();

    assert_eq!(mgr.try_restore(&mut radio, &mut store), RestoreOutcome::Resumed);
    assert_eq!(
        radio.calls,
        vec![
            RadioCall::LoadNonces(vec![0x11; NONCES_LEN]),
            RadioCall::LoadSession(vec![0x22; SESSION_LEN]),
            RadioCall::Activate,
        ]
    );
    assert_eq!(mgr.phase(), SessionPhase::Resumed);
    assert!(store.handles_balanced());
}

#[test]
fn new_session_on_restore_is_not_a_resume() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    radio.activations.push_back(Activation::NewSession);

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert_eq!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Corrupt(Corruption::NotRestored(
            Activation::NewSession
        )))
    );
}

#[test]
fn store_open_failure_reads_nothing() {
    let mut store = stored_record();
    store.fail_open = true;
    let mut radio = MockRadio::new();

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert_eq!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::StoreUnavailable(StorageError::IoError(-1)))
    );
    assert_eq!(store.opens, 0);
    assert!(radio.calls.is_empty());
}

#[test]
fn short_nonce_blob_is_never_handed_to_the_stack() {
    let mut store = MockStore::with_record(&[0x11; NONCES_LEN - 1], &[0x22; SESSION_LEN]);
    let mut radio = MockRadio::new();

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert_eq!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Corrupt(Corruption::SizeMismatch {
            key: NONCES_KEY,
            expected: NONCES_LEN,
            found: NONCES_LEN - 1,
        }))
    );
    assert!(!radio.loaded_anything());
}

#[test]
fn oversized_session_blob_is_corrupt() {
    let mut store = MockStore::with_record(&[0x11; NONCES_LEN], &[0x22; SESSION_LEN + 8]);
    let mut radio = MockRadio::new();

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert!(matches!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Corrupt(Corruption::SizeMismatch {
            key: SESSION_KEY,
            ..
        }))
    ));
    assert!(!radio.loaded_anything());
}

#[test]
fn nonces_without_session_is_absent() {
    let mut store = MockStore::new();
    store.put(NONCES_KEY, &[0x11; NONCES_LEN]);
    let mut radio = MockRadio::new();

    assert_eq!(
        SessionManager::new().try_restore(&mut radio, &mut store),
        RestoreOutcome::NotAvailable(SessionError::Absent { key: SESSION_KEY })
    );
}

#[test]
fn rejected_nonces_stop_before_session_load() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    radio.reject_nonces = Some(-1118);

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert_eq!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Corrupt(Corruption::Rejected {
            key: NONCES_KEY,
            code: -1118,
        }))
    );
    assert_eq!(radio.count(|c| matches!(c, RadioCall::LoadSession(_))), 0);
    assert_eq!(radio.activations_seen(), 0);
}

#[test]
fn rejected_session_is_not_activated() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    radio.reject_session = Some(-1119);

    let outcome = SessionManager::new().try_restore(&mut radio, &mut store);

    assert!(matches!(
        outcome,
        RestoreOutcome::NotAvailable(SessionError::Corrupt(Corruption::Rejected {
            key: SESSION_KEY,
            ..
        }))
    ));
    assert_eq!(radio.activations_seen(), 0);
}

// ── Establish ─────────────────────────────────────────────────

#[test]
fn establish_falls_through_to_join() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();
    let mut mgr = SessionManager::new();

    let origin = mgr.establish(&mut radio, &mut store, &mut sink).unwrap();

    assert_eq!(origin, SessionOrigin::Joined);
    assert_eq!(mgr.phase(), SessionPhase::Ready(SessionOrigin::Joined));
    assert_eq!(
        sink.events,
        vec![
            CycleEvent::RestoreSkipped(SessionError::Absent { key: NONCES_KEY }),
            CycleEvent::SessionReady(SessionOrigin::Joined),
        ]
    );
}

#[test]
fn establish_after_refused_restore_joins_once() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    radio.activations.push_back(Activation::NewSession);
    let mut sink = RecordingSink::new();

    let origin = SessionManager::new()
        .establish(&mut radio, &mut store, &mut sink)
        .unwrap();

    assert_eq!(origin, SessionOrigin::Joined);
    assert_eq!(radio.activations_seen(), 2);
}

#[test]
fn establish_resumed_skips_join() {
    let mut store = stored_record();
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();

    let origin = SessionManager::new()
        .establish(&mut radio, &mut store, &mut sink)
        .unwrap();

    assert_eq!(origin, SessionOrigin::Resumed);
    assert_eq!(radio.activations_seen(), 1);
    assert_eq!(sink.events, vec![CycleEvent::SessionReady(SessionOrigin::Resumed)]);
}

#[test]
fn failed_join_is_a_cycle_error() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    radio.activations.push_back(Activation::Failed(-1116));
    let mut sink = RecordingSink::new();
    let mut mgr = SessionManager::new();

    let result = mgr.establish(&mut radio, &mut store, &mut sink);

    assert_eq!(
        result,
        Err(CycleError::Join(JoinError(Activation::Failed(-1116))))
    );
    assert_eq!(mgr.phase(), SessionPhase::Failed);
    assert!(
        !sink
            .events
            .iter()
            .any(|e| matches!(e, CycleEvent::SessionReady(_)))
    );
}

#[test]
fn restored_reply_to_a_join_is_a_failure() {
    let mut mgr = SessionManager::new();
    let mut radio = MockRadio::new();
    radio.activations.push_back(Activation::SessionRestored);

    assert_eq!(
        mgr.join_fresh(&mut radio),
        Err(JoinError(Activation::SessionRestored))
    );
}

// ── Persist ───────────────────────────────────────────────────

#[test]
fn persist_writes_nonces_then_session() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();
    mgr.join_fresh(&mut radio).unwrap();
    radio.send_receive(&[0; 5]);

    assert_eq!(mgr.persist(&radio, &mut store), PersistOutcome::Saved);
    assert_eq!(store.writes, vec![NONCES_KEY.to_string(), SESSION_KEY.to_string()]);
    assert_eq!(store.get(NONCES_KEY).unwrap().as_slice(), radio.nonces.as_slice());
    assert_eq!(store.get(SESSION_KEY).unwrap().as_slice(), radio.session.as_slice());
    assert!(store.handles_balanced());
}

#[test]
fn persist_twice_stores_identical_bytes() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();
    mgr.join_fresh(&mut radio).unwrap();

    mgr.persist(&radio, &mut store);
    let first = (store.get(NONCES_KEY).cloned(), store.get(SESSION_KEY).cloned());
    mgr.persist(&radio, &mut store);
    let second = (store.get(NONCES_KEY).cloned(), store.get(SESSION_KEY).cloned());

    assert_eq!(first, second);
    assert_eq!(store.get(SESSION_KEY).map(Vec::len), Some(SESSION_LEN));
}

#[test]
fn failed_nonce_write_leaves_session_untouched() {
    let mut store = stored_record();
    store.fail_write = Some(NONCES_KEY);
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();
    mgr.join_fresh(&mut radio).unwrap();

    assert_eq!(
        mgr.persist(&radio, &mut store),
        PersistOutcome::Skipped(PersistFailure::StoreUnavailable(StorageError::IoError(-2)))
    );
    assert!(store.writes.is_empty());
    assert_eq!(store.get(SESSION_KEY), Some(&vec![0x22; SESSION_LEN]));
    assert!(store.handles_balanced());
}

#[test]
fn failed_session_write_keeps_new_nonces() {
    let mut store = MockStore::new();
    store.fail_write = Some(SESSION_KEY);
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();
    mgr.join_fresh(&mut radio).unwrap();

    let outcome = mgr.persist(&radio, &mut store);

    assert!(matches!(outcome, PersistOutcome::Skipped(PersistFailure::StoreUnavailable(_))));
    assert_eq!(store.writes, vec![NONCES_KEY.to_string()]);
}

#[test]
fn wrong_sized_stack_buffers_are_not_written() {
    let mut store = MockStore::new();
    let mut radio = MockRadio::new();
    radio.session = vec![0; 10];

    let outcome = SessionManager::new().persist(&radio, &mut store);

    assert!(matches!(
        outcome,
        PersistOutcome::Skipped(PersistFailure::BadBuffers(CodecError::SizeMismatch { .. }))
    ));
    assert_eq!(store.opens, 0);
}

#[test]
fn persist_with_store_down_is_skipped() {
    let mut store = MockStore::new();
    store.fail_open = true;
    let mut radio = MockRadio::new();
    let mut mgr = SessionManager::new();
    mgr.join_fresh(&mut radio).unwrap();

    assert_eq!(
        mgr.persist(&radio, &mut store),
        PersistOutcome::Skipped(PersistFailure::StoreUnavailable(StorageError::IoError(-1)))
    );
}

// ── Factory reset ─────────────────────────────────────────────

#[test]
fn factory_reset_forces_a_join() {
    let mut store = stored_record();
    store.put("other", &[1]);
    session::factory_reset(&mut store).unwrap();

    assert!(store.get(NONCES_KEY).is_none());
    assert!(store.get(SESSION_KEY).is_none());
    assert!(store.handles_balanced());

    let mut radio = MockRadio::new();
    assert!(matches!(
        SessionManager::new().try_restore(&mut radio, &mut store),
        RestoreOutcome::NotAvailable(SessionError::Absent { .. })
    ));
}
