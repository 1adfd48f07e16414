//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Canonical hashing: key insertion order never changes a digest
//! - FIFO commit: Blocks carry accepted transactions in submission order
//! - Chain integrity: Any accepted history verifies end to end
//! - Intake isolation: Rejected transactions never reach the pending pool

use akin_ledger::{hashing, App, AppRegistry, Error, Ledger, Transaction};
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{json, Map, Value};

const CHAIN: &str = "AKIN:CHAIN:PROP";
const VALIDATOR: &str = "AKIN:VALIDATOR:1";

/// Records every applied `seq` value in commit order
struct Journal;

#[derive(Debug, Default, Serialize)]
struct JournalState {
    applied: Vec<u64>,
}

impl App for Journal {
    type State = JournalState;

    fn name(&self) -> &str {
        "journal"
    }

    fn validate(&self, tx: &Transaction, _state: &JournalState) -> Result<(), String> {
        match tx.payload().get("seq").and_then(Value::as_u64) {
            Some(_) => Ok(()),
            None => Err("seq required".to_string()),
        }
    }

    fn apply(&self, tx: &Transaction, state: &mut JournalState) {
        if let Some(seq) = tx.payload().get("seq").and_then(Value::as_u64) {
            state.applied.push(seq);
        }
    }
}

fn create_test_ledger() -> Ledger {
    let apps = AppRegistry::new().register(Journal).unwrap();
    Ledger::new(CHAIN, [VALIDATOR], apps).unwrap()
}

fn entry(seq: u64) -> Transaction {
    Transaction::builder(CHAIN, "journal", "AKIN:USER:1")
        .payload(json!({ "seq": seq }))
        .signed_by("AKIN:USER:1")
        .build()
        .unwrap()
}

/// Strategy for generating flat JSON objects as key/value pairs
fn entries_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z_]{1,8}", any::<i64>(), 1..12)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for splitting a run of transactions into proposal batches
fn batches_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..6, 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Key insertion order never affects the digest
    #[test]
    fn prop_hash_independent_of_key_order(entries in entries_strategy()) {
        let forward: Map<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let reversed: Map<String, Value> = entries
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();

        let nested_forward = json!({ "outer": forward.clone(), "list": [forward.clone()] });
        let nested_reversed = json!({ "list": [reversed.clone()], "outer": reversed.clone() });

        prop_assert_eq!(hashing::hash(&forward).unwrap(), hashing::hash(&reversed).unwrap());
        prop_assert_eq!(
            hashing::hash(&nested_forward).unwrap(),
            hashing::hash(&nested_reversed).unwrap()
        );
    }

    /// Property: Digests are lowercase 64-char hex
    #[test]
    fn prop_hash_is_lowercase_hex(entries in entries_strategy()) {
        let object: Map<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect();
        let digest = hashing::hash(&object).unwrap();

        prop_assert_eq!(digest.len(), 64);
        prop_assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    /// Property: Applied order equals submission order across any batching
    #[test]
    fn prop_fifo_commit_order(batches in batches_strategy()) {
        let mut ledger = create_test_ledger();
        let mut next_seq = 0u64;

        for (round, size) in batches.iter().enumerate() {
            for _ in 0..*size {
                ledger.add_transaction(entry(next_seq)).unwrap();
                next_seq += 1;
            }
            let index = ledger.propose_block(VALIDATOR).unwrap();
            prop_assert_eq!(index, round as u64 + 1);
            prop_assert!(ledger.pending().is_empty());
        }

        let state: &JournalState = ledger.app_state("journal").unwrap();
        let expected: Vec<u64> = (0..next_seq).collect();
        prop_assert_eq!(&state.applied, &expected);

        let committed: Vec<u64> = ledger
            .blocks()
            .iter()
            .flat_map(|block| block.transactions())
            .filter_map(|tx| tx.payload().get("seq").and_then(Value::as_u64))
            .collect();
        prop_assert_eq!(committed, expected);
    }

    /// Property: Every history built through the ledger verifies
    #[test]
    fn prop_chain_always_valid(batches in batches_strategy()) {
        let mut ledger = create_test_ledger();

        for size in batches {
            for seq in 0..size as u64 {
                ledger.add_transaction(entry(seq)).unwrap();
            }
            ledger.propose_block(VALIDATOR).unwrap();
            prop_assert!(ledger.is_valid_chain().is_ok());
        }

        for pair in ledger.blocks().windows(2) {
            prop_assert_eq!(pair[1].prev_hash(), pair[0].block_hash());
            prop_assert_eq!(pair[1].block_hash(), pair[1].compute_hash().unwrap());
            prop_assert_eq!(pair[1].validator_signature(), format!("sig_by_{}", VALIDATOR));
        }
    }

    /// Property: Rejected transactions never enter the pending pool
    #[test]
    fn prop_rejections_leave_pool_untouched(
        valid in prop::collection::vec(any::<bool>(), 1..30)
    ) {
        let mut ledger = create_test_ledger();
        let mut accepted = 0usize;

        for (seq, ok) in valid.iter().enumerate() {
            let tx = if *ok {
                entry(seq as u64)
            } else {
                Transaction::builder(CHAIN, "journal", "AKIN:USER:1").build().unwrap()
            };

            match ledger.add_transaction(tx) {
                Ok(()) => accepted += 1,
                Err(Error::AppRejected(reason)) => prop_assert_eq!(reason, "seq required"),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        prop_assert_eq!(ledger.pending().len(), accepted);
        let state: &JournalState = ledger.app_state("journal").unwrap();
        prop_assert!(state.applied.is_empty());
    }

    /// Property: Only registered validators may propose
    #[test]
    fn prop_unauthorized_validator_rejected(validator in "AKIN:VALIDATOR:[2-9][0-9]{0,2}") {
        let mut ledger = create_test_ledger();
        ledger.add_transaction(entry(0)).unwrap();

        let err = ledger.propose_block(&validator).unwrap_err();
        prop_assert!(matches!(err, Error::UnauthorizedValidator(_)));
        prop_assert_eq!(ledger.blocks().len(), 1);
        prop_assert_eq!(ledger.pending().len(), 1);
    }
}
