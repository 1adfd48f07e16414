//! End-to-end confirmation session scenarios

use akin_apps::{DemoSession, DemoSessionState, SessionStatus, DEMO_SESSION};
use akin_ledger::{spawn_ledger_actor, AppRegistry, Error, Ledger, Outcome, Transaction};
use serde_json::{json, Value};

const CHAIN_ID: &str = "AKIN:CHAIN:DEMO";
const VALIDATOR: &str = "AKIN:VALIDATOR:1";
const REQUIRED: [&str; 3] = ["AKIN:USER:1", "AKIN:ORG:AT", "AKIN:SYS:PAY"];

fn create_ledger() -> Ledger {
    let apps = AppRegistry::new().register(DemoSession::new()).unwrap();
    Ledger::new(CHAIN_ID, [VALIDATOR], apps).unwrap()
}

fn create_session() -> Transaction {
    Transaction::builder(CHAIN_ID, DEMO_SESSION, REQUIRED[0])
        .payload(json!({
            "action": "create",
            "service_id": "SESSION-1",
            "participants": REQUIRED,
            "required_signers": REQUIRED,
        }))
        .signed_by(REQUIRED[0])
        .build()
        .unwrap()
}

fn sign(signer: &str) -> Transaction {
    Transaction::builder(CHAIN_ID, DEMO_SESSION, signer)
        .payload(json!({"action": "sign", "service_id": "SESSION-1"}))
        .signed_by(signer)
        .build()
        .unwrap()
}

fn status(ledger: &Ledger) -> SessionStatus {
    let state: &DemoSessionState = ledger.app_state(DEMO_SESSION).unwrap();
    state.session("SESSION-1").unwrap().status
}

#[test]
fn test_three_signer_session() {
    let mut ledger = create_ledger();

    let outcome = Outcome::intake(&ledger.add_transaction(create_session()));
    assert_eq!(outcome, Outcome::ok("queued"));
    for signer in &REQUIRED[..2] {
        ledger.add_transaction(sign(signer)).unwrap();
    }

    let outcome = Outcome::proposal(&ledger.propose_block(VALIDATOR));
    assert_eq!(outcome, Outcome::ok("block 1 added"));
    assert_eq!(ledger.blocks()[1].transactions().len(), 3);
    assert_eq!(status(&ledger), SessionStatus::Pending);
    assert!(ledger.is_valid_chain().is_ok());

    let state: &DemoSessionState = ledger.app_state(DEMO_SESSION).unwrap();
    let collected = &state.session("SESSION-1").unwrap().signatures_collected;
    assert!(collected["AKIN:USER:1"]);
    assert!(collected["AKIN:ORG:AT"]);
    assert!(!collected["AKIN:SYS:PAY"]);

    ledger.add_transaction(sign(REQUIRED[2])).unwrap();
    let outcome = Outcome::proposal(&ledger.propose_block(VALIDATOR));
    assert_eq!(outcome, Outcome::ok("block 2 added"));
    assert_eq!(status(&ledger), SessionStatus::Completed);

    let outcome = Outcome::verification(&ledger.is_valid_chain());
    assert_eq!(outcome, Outcome::ok("ok"));
    assert_eq!(ledger.blocks().len(), 3);
}

#[test]
fn test_invalid_session_transactions_rejected() {
    let mut ledger = create_ledger();

    let no_signers = Transaction::builder(CHAIN_ID, DEMO_SESSION, REQUIRED[0])
        .payload(json!({"action": "create", "service_id": "S", "participants": []}))
        .build()
        .unwrap();
    let outcome = Outcome::intake(&ledger.add_transaction(no_signers));
    assert_eq!(outcome, Outcome::rejected("required_signers list required"));

    let foreign = Transaction::builder("AKIN:CHAIN:OTHER", DEMO_SESSION, REQUIRED[0])
        .build()
        .unwrap();
    let outcome = Outcome::intake(&ledger.add_transaction(foreign));
    assert_eq!(outcome, Outcome::rejected("wrong chain_id"));

    let unknown = Transaction::builder(CHAIN_ID, "escrow", REQUIRED[0])
        .build()
        .unwrap();
    let outcome = Outcome::intake(&ledger.add_transaction(unknown));
    assert_eq!(outcome, Outcome::rejected("unknown app"));

    assert!(ledger.pending().is_empty());
    let outcome = Outcome::proposal(&ledger.propose_block(VALIDATOR));
    assert_eq!(outcome, Outcome::rejected("no pending txs"));
}

#[test]
fn test_sign_committed_before_create_is_noop() {
    let mut ledger = create_ledger();

    // Accepted at intake; the session does not exist when it applies.
    ledger.add_transaction(sign(REQUIRED[1])).unwrap();
    ledger.add_transaction(create_session()).unwrap();
    ledger.propose_block(VALIDATOR).unwrap();

    let state: &DemoSessionState = ledger.app_state(DEMO_SESSION).unwrap();
    let collected = &state.session("SESSION-1").unwrap().signatures_collected;
    assert!(collected.values().all(|signed| !signed));
}

#[test]
fn test_unauthorized_proposal_keeps_pending() {
    let mut ledger = create_ledger();
    ledger.add_transaction(create_session()).unwrap();

    let err = ledger.propose_block("AKIN:VALIDATOR:9").unwrap_err();
    assert!(matches!(err, Error::UnauthorizedValidator(_)));
    assert_eq!(ledger.pending().len(), 1);
    assert_eq!(ledger.blocks().len(), 1);
}

#[tokio::test]
async fn test_scenario_through_actor() {
    let handle = spawn_ledger_actor(create_ledger(), 8);

    handle.add_transaction(create_session()).await.unwrap();
    for signer in &REQUIRED[..2] {
        handle.add_transaction(sign(signer)).await.unwrap();
    }
    assert_eq!(handle.propose_block(VALIDATOR).await.unwrap(), 1);

    let state = handle.app_state(DEMO_SESSION).await.unwrap().unwrap();
    assert_eq!(state["sessions"]["SESSION-1"]["status"], Value::from("pending"));

    handle.add_transaction(sign(REQUIRED[2])).await.unwrap();
    assert_eq!(handle.propose_block(VALIDATOR).await.unwrap(), 2);

    let state = handle.app_state(DEMO_SESSION).await.unwrap().unwrap();
    assert_eq!(state["sessions"]["SESSION-1"]["status"], Value::from("completed"));
    assert_eq!(
        state["sessions"]["SESSION-1"]["signatures_collected"],
        json!({"AKIN:ORG:AT": true, "AKIN:SYS:PAY": true, "AKIN:USER:1": true})
    );

    assert!(handle.is_valid_chain().await.is_ok());
    handle.shutdown().await.unwrap();
}
