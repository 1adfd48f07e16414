//! Error types for the ledger
//!
//! Intake and proposal rejections display as the short reason strings that
//! drivers print, e.g. `"wrong chain_id"` or `"no pending txs"`.

use std::fmt;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which hash-chain check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashCheck {
    /// `prev_hash` does not match the predecessor's `block_hash`
    PrevHash,
    /// `block_hash` does not match a fresh recomputation
    BlockHash,
}

impl fmt::Display for HashCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashCheck::PrevHash => write!(f, "prev_hash"),
            HashCheck::BlockHash => write!(f, "block_hash"),
        }
    }
}

// Chain walks report the block hash check as plain "hash".
fn chain_label(check: &HashCheck) -> &'static str {
    match check {
        HashCheck::PrevHash => "prev_hash",
        HashCheck::BlockHash => "hash",
    }
}

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Transaction targets another chain
    #[error("wrong chain_id")]
    ChainMismatch {
        /// This ledger's chain id
        expected: String,
        /// The transaction's chain id
        actual: String,
    },

    /// Transaction names an app that is not registered
    #[error("unknown app")]
    UnknownApp(String),

    /// App validation rejected the transaction (reason verbatim)
    #[error("{0}")]
    AppRejected(String),

    /// Proposer is not in the authorized validator set
    #[error("unauthorized validator")]
    UnauthorizedValidator(String),

    /// Nothing to propose
    #[error("no pending txs")]
    EmptyPendingQueue,

    /// Candidate block failed its own integrity check
    #[error("{0} mismatch")]
    HashChainCorruption(HashCheck),

    /// Committed chain failed verification
    #[error("{} mismatch at {index}", chain_label(.check))]
    InvalidChain {
        /// Index of the first offending block
        index: u64,
        /// Check that failed
        check: HashCheck,
    },

    /// Malformed transaction (rejected before intake)
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Two apps registered under the same name
    #[error("Duplicate app: {0}")]
    DuplicateApp(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Routine rejection of a caller request, as opposed to an integrity or
    /// infrastructure fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::ChainMismatch { .. }
                | Error::UnknownApp(_)
                | Error::AppRejected(_)
                | Error::UnauthorizedValidator(_)
                | Error::EmptyPendingQueue
                | Error::InvalidTransaction(_)
        )
    }

    /// Hash-chain corruption; should be treated as a fatal alarm.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            Error::HashChainCorruption(_) | Error::InvalidChain { .. }
        )
    }
}

/// Flattened `(accepted, message)` view of an operation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the operation succeeded
    pub accepted: bool,
    /// Success message or rejection reason
    pub message: String,
}

impl Outcome {
    /// Successful outcome
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    /// Failed outcome
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }

    /// Build from a result, using `message` on success
    pub fn from_result<T>(result: &Result<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self::ok(message(value)),
            Err(err) => Self::rejected(err.to_string()),
        }
    }

    /// Intake outcome (`"queued"` on success)
    pub fn intake(result: &Result<()>) -> Self {
        Self::from_result(result, |_| "queued".to_string())
    }

    /// Proposal outcome (`"block <index> added"` on success)
    pub fn proposal(result: &Result<u64>) -> Self {
        Self::from_result(result, |index| format!("block {} added", index))
    }

    /// Verification outcome (`"ok"` on success)
    pub fn verification(result: &Result<()>) -> Self {
        Self::from_result(result, |_| "ok".to_string())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.accepted, self.message)
    }
}
