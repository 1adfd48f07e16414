//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic hashing (canonical JSON, see [`crate::hashing`])
//! - Immutability after construction (builders, read-only accessors)
//! - Integer timestamps (milliseconds since Unix epoch)

use crate::{hashing, Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// `prev_hash` of the genesis block
pub const GENESIS_PREV_HASH: &str = "0x0";

/// `validator` of the genesis block
pub const GENESIS_VALIDATOR: &str = "GENESIS";

/// `sig` carried by placeholder signatures
pub const PLACEHOLDER_SIG: &str = "dummy";

/// Opaque transaction payload, interpreted only by the target app
pub type Payload = Map<String, Value>;

/// Current time in milliseconds since Unix epoch
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Signer attestation (no cryptographic meaning)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
    signer: String,
    sig: String,
}

impl Signature {
    /// Create a signature
    pub fn new(signer: impl Into<String>, sig: impl Into<String>) -> Self {
        Self {
            signer: signer.into(),
            sig: sig.into(),
        }
    }

    /// Placeholder signature claiming `signer` signed
    pub fn placeholder(signer: impl Into<String>) -> Self {
        Self::new(signer, PLACEHOLDER_SIG)
    }

    /// Claimed signer identity
    pub fn signer(&self) -> &str {
        &self.signer
    }

    /// Opaque signature value
    pub fn sig(&self) -> &str {
        &self.sig
    }
}

/// Transaction addressed to one app on one chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) chain_id: String,
    pub(crate) app: String,
    pub(crate) sender: String,
    pub(crate) payload: Payload,
    pub(crate) signatures: Vec<Signature>,
    pub(crate) timestamp: u64,
}

impl Transaction {
    /// Start building a transaction
    pub fn builder(
        chain_id: impl Into<String>,
        app: impl Into<String>,
        sender: impl Into<String>,
    ) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            chain_id: chain_id.into(),
            app: app.into(),
            sender: sender.into(),
            payload: Value::Object(Map::new()),
            signatures: Vec::new(),
            timestamp: None,
        }
    }

    /// Unique transaction ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Target chain
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Target app name
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Sender identity
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// App-specific payload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Payload field as a string, if present and a string
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Signatures in attachment order
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Creation timestamp (ms)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Canonical hash of the transaction
    pub fn hash(&self) -> Result<String> {
        hashing::hash(self)
    }
}

/// Builder for [`Transaction`]
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    id: Option<String>,
    chain_id: String,
    app: String,
    sender: String,
    payload: Value,
    signatures: Vec<Signature>,
    timestamp: Option<u64>,
}

impl TransactionBuilder {
    /// Use an explicit ID instead of a fresh UUID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the payload (must be a JSON object)
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a signature
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Attach a placeholder signature from `signer`
    pub fn signed_by(self, signer: impl Into<String>) -> Self {
        self.signature(Signature::placeholder(signer))
    }

    /// Use an explicit timestamp (ms) instead of the current time
    pub fn timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Freeze the transaction
    pub fn build(self) -> Result<Transaction> {
        let payload = match self.payload {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidTransaction(format!(
                    "payload must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        Ok(Transaction {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            chain_id: self.chain_id,
            app: self.app,
            sender: self.sender,
            payload,
            signatures: self.signatures,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Hash-linked block of transactions
///
/// Built only through [`Block::builder`] or [`Block::genesis`], so
/// `block_hash` always comes from `compute_hash`. Blocks serialize but do
/// not deserialize:
///
/// ```compile_fail
/// fn deserializable<T: serde::de::DeserializeOwned>() {}
/// deserializable::<akin_ledger::Block>();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: u64,
    pub(crate) prev_hash: String,
    pub(crate) validator: String,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) block_hash: String,
    pub(crate) validator_signature: String,
}

/// Fields covered by `block_hash`
#[derive(Serialize)]
struct HashedFields<'a> {
    index: u64,
    timestamp: u64,
    prev_hash: &'a str,
    validator: &'a str,
    transactions: &'a [Transaction],
}

impl Block {
    /// Genesis block (index 0, sentinel linkage, no transactions)
    pub fn genesis(timestamp: u64) -> Result<Self> {
        Block::builder(0, GENESIS_PREV_HASH, GENESIS_VALIDATOR)
            .timestamp(timestamp)
            .build()
    }

    /// Start building a block
    pub fn builder(
        index: u64,
        prev_hash: impl Into<String>,
        validator: impl Into<String>,
    ) -> BlockBuilder {
        BlockBuilder {
            index,
            timestamp: None,
            prev_hash: prev_hash.into(),
            validator: validator.into(),
            transactions: Vec::new(),
        }
    }

    /// Recompute the hash over every field except `block_hash` and
    /// `validator_signature`
    pub fn compute_hash(&self) -> Result<String> {
        hashing::hash(&HashedFields {
            index: self.index,
            timestamp: self.timestamp,
            prev_hash: &self.prev_hash,
            validator: &self.validator,
            transactions: &self.transactions,
        })
    }

    /// Assign the validator marker. Not covered by `block_hash`.
    pub fn with_validator_marker(mut self) -> Self {
        self.validator_signature = format!("sig_by_{}", self.validator);
        self
    }

    /// Block index (height)
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Creation timestamp (ms)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Predecessor's block hash
    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    /// Proposing validator
    pub fn validator(&self) -> &str {
        &self.validator
    }

    /// Transactions in commit order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Hash computed at construction
    pub fn block_hash(&self) -> &str {
        &self.block_hash
    }

    /// Validator marker
    pub fn validator_signature(&self) -> &str {
        &self.validator_signature
    }

    /// Is this the genesis block
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub(crate) fn seal(&mut self) -> Result<()> {
        self.block_hash = self.compute_hash()?;
        Ok(())
    }

    pub(crate) fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }
}

/// Builder for [`Block`]
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    index: u64,
    timestamp: Option<u64>,
    prev_hash: String,
    validator: String,
    transactions: Vec<Transaction>,
}

impl BlockBuilder {
    /// Use an explicit timestamp (ms) instead of the current time
    pub fn timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Set the block's transactions
    pub fn transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Compute `block_hash` and freeze the block
    pub fn build(self) -> Result<Block> {
        let mut block = self.assemble();
        block.seal()?;
        Ok(block)
    }

    /// Block with every hashed field set and `block_hash` still empty.
    /// Keeps ownership of the transactions with the caller if sealing fails.
    pub(crate) fn assemble(self) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp.unwrap_or_else(now_millis),
            prev_hash: self.prev_hash,
            validator: self.validator,
            transactions: self.transactions,
            block_hash: String::new(),
            validator_signature: String::new(),
        }
    }
}
