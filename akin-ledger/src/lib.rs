//! Akin Ledger Core
//!
//! Single-authority (proof of authority) ledger: an append-only sequence of
//! hash-linked blocks whose transactions mutate per-application state through
//! pluggable apps.
//!
//! # Architecture
//!
//! - **Canonical hashing**: Structurally equal values produce identical digests
//! - **Pluggable apps**: Domain logic implements [`App`] (validate + apply)
//! - **Single Writer**: One actor task owns all ledger state
//! - **Atomic commit**: A block is appended whole or not at all
//!
//! # Invariants
//!
//! - Append-only: Blocks are never modified, reordered, or removed
//! - Linkage: `blocks[i].prev_hash == blocks[i - 1].block_hash`
//! - Integrity: `blocks[i].block_hash == recompute(blocks[i])`
//! - FIFO commit: Blocks carry pending transactions in submission order

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod app;
pub mod config;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod metrics;
pub mod types;

// Re-exports
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use app::{App, AppRegistry};
pub use config::Config;
pub use error::{Error, HashCheck, Outcome, Result};
pub use ledger::Ledger;
pub use types::{Block, Payload, Signature, Transaction, TransactionBuilder};
