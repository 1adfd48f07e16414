//! Ledger core
//!
//! Owns the chain, the pending pool and every app's state, and orchestrates
//! intake, block proposal, commit and verification.
//!
//! # Example
//!
//! ```no_run
//! use akin_ledger::{AppRegistry, Ledger, Outcome};
//!
//! fn main() -> akin_ledger::Result<()> {
//!     let apps = AppRegistry::new(); // .register(MyApp)?
//!     let mut ledger = Ledger::new("AKIN:CHAIN:DEMO", ["AKIN:VALIDATOR:1"], apps)?;
//!
//!     // let result = ledger.add_transaction(tx);
//!     let result = ledger.propose_block("AKIN:VALIDATOR:1");
//!     println!("{}", Outcome::proposal(&result)); // (false, "no pending txs")
//!
//!     assert!(ledger.is_valid_chain().is_ok());
//!     Ok(())
//! }
//! ```
//!
//! # Intake policy
//!
//! Apps validate against committed state only. Two queued transactions that
//! touch the same entity are each validated independently; `apply` resolves
//! them in FIFO order when the block commits.

use crate::{
    app::AppRegistry,
    metrics::Metrics,
    types::{now_millis, Block, Transaction},
    Config, Error, HashCheck, Result,
};
use serde_json::Value;
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Single-authority ledger
#[derive(Debug)]
pub struct Ledger {
    /// Chain identifier transactions must carry
    chain_id: String,

    /// Identities allowed to propose blocks
    validators: BTreeSet<String>,

    /// Registered apps with their state
    apps: AppRegistry,

    /// Append-only chain, genesis first
    blocks: Vec<Block>,

    /// Accepted, uncommitted transactions (FIFO)
    pending: VecDeque<Transaction>,

    /// Metrics
    metrics: Metrics,
}

impl Ledger {
    /// Create a ledger with a fresh genesis block
    pub fn new<I, S>(chain_id: impl Into<String>, validators: I, apps: AppRegistry) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let metrics = Metrics::new()
            .map_err(|e| Error::Other(format!("Failed to create metrics: {}", e)))?;
        let genesis = Block::genesis(now_millis())?;

        let ledger = Self {
            chain_id: chain_id.into(),
            validators: validators.into_iter().map(Into::into).collect(),
            apps,
            blocks: vec![genesis],
            pending: VecDeque::new(),
            metrics,
        };

        info!(
            chain_id = %ledger.chain_id,
            validators = ledger.validators.len(),
            apps = ledger.apps.len(),
            genesis = %ledger.tip().block_hash(),
            "Ledger initialized"
        );

        Ok(ledger)
    }

    /// Create a ledger from configuration
    pub fn from_config(config: &Config, apps: AppRegistry) -> Result<Self> {
        config.validate()?;
        Self::new(config.chain_id.clone(), config.validators.iter().cloned(), apps)
    }

    /// Validate `tx` and queue it for the next block
    ///
    /// Only the pending pool changes; app state is never touched here.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        if let Err(err) = self.check_intake(&tx) {
            warn!(tx_id = %tx.id(), app = %tx.app(), reason = %err, "Transaction rejected");
            self.metrics.record_rejected();
            return Err(err);
        }

        debug!(tx_id = %tx.id(), app = %tx.app(), sender = %tx.sender(), "Transaction queued");
        self.pending.push_back(tx);
        self.metrics.record_accepted(self.pending.len());
        Ok(())
    }

    fn check_intake(&self, tx: &Transaction) -> Result<()> {
        if tx.chain_id() != self.chain_id {
            return Err(Error::ChainMismatch {
                expected: self.chain_id.clone(),
                actual: tx.chain_id().to_string(),
            });
        }

        let app = self
            .apps
            .get(tx.app())
            .ok_or_else(|| Error::UnknownApp(tx.app().to_string()))?;

        app.validate(tx).map_err(Error::AppRejected)
    }

    /// Drain the pending pool into a new block proposed by `validator`
    ///
    /// Returns the new block's index.
    pub fn propose_block(&mut self, validator: &str) -> Result<u64> {
        if !self.validators.contains(validator) {
            warn!(validator, "Unauthorized block proposal");
            return Err(Error::UnauthorizedValidator(validator.to_string()));
        }

        if self.pending.is_empty() {
            return Err(Error::EmptyPendingQueue);
        }

        let txs: Vec<Transaction> = self.pending.drain(..).collect();
        let mut candidate = Block::builder(self.next_index(), self.tip().block_hash(), validator)
            .transactions(txs)
            .assemble();

        if let Err(err) = candidate.seal() {
            self.restore_pending(candidate.into_transactions());
            return Err(err);
        }

        self.commit(candidate.with_validator_marker())
    }

    /// Verify, append and apply a sealed candidate
    fn commit(&mut self, candidate: Block) -> Result<u64> {
        if let Err(err) = self.verify_candidate(&candidate) {
            error!(
                index = candidate.index(),
                reason = %err,
                "Candidate block failed integrity check; chain may be corrupt"
            );
            self.restore_pending(candidate.into_transactions());
            self.metrics.set_pending(self.pending.len());
            return Err(err);
        }

        let index = candidate.index();
        let tx_count = candidate.transactions().len();
        let block_hash = candidate.block_hash().to_string();
        self.blocks.push(candidate);

        // Apply in FIFO order, no rollback.
        let started = Instant::now();
        if let Some(block) = self.blocks.last() {
            for tx in block.transactions() {
                match self.apps.get_mut(tx.app()) {
                    Some(app) => {
                        if let Err(fault) = app.apply(tx) {
                            error!(
                                index,
                                tx_id = %tx.id(),
                                app = %tx.app(),
                                fault = %fault,
                                "App panicked while applying committed transaction"
                            );
                        }
                    }
                    None => warn!(tx_id = %tx.id(), app = %tx.app(), "No app for committed transaction"),
                }
            }
        }

        self.metrics
            .record_block_committed(started.elapsed().as_secs_f64());
        self.metrics.set_pending(self.pending.len());

        info!(index, txs = tx_count, hash = %block_hash, "Block committed");
        Ok(index)
    }

    fn verify_candidate(&self, candidate: &Block) -> Result<()> {
        if candidate.prev_hash() != self.tip().block_hash() {
            return Err(Error::HashChainCorruption(HashCheck::PrevHash));
        }
        if candidate.block_hash() != candidate.compute_hash()? {
            return Err(Error::HashChainCorruption(HashCheck::BlockHash));
        }
        Ok(())
    }

    /// Put `txs` back at the head of the pending pool, in their original order
    fn restore_pending(&mut self, txs: Vec<Transaction>) {
        for tx in txs.into_iter().rev() {
            self.pending.push_front(tx);
        }
    }

    /// Verify linkage and hashes of every block after genesis
    pub fn is_valid_chain(&self) -> Result<()> {
        for (offset, pair) in self.blocks.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            let index = offset as u64 + 1;

            if current.prev_hash() != prev.block_hash() {
                return Err(Error::InvalidChain {
                    index,
                    check: HashCheck::PrevHash,
                });
            }
            if current.block_hash() != current.compute_hash()? {
                return Err(Error::InvalidChain {
                    index,
                    check: HashCheck::BlockHash,
                });
            }
        }
        Ok(())
    }

    /// Chain identifier
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Authorized validators (sorted)
    pub fn validators(&self) -> impl Iterator<Item = &str> {
        self.validators.iter().map(String::as_str)
    }

    /// Is `id` an authorized validator
    pub fn is_validator(&self, id: &str) -> bool {
        self.validators.contains(id)
    }

    /// Committed blocks, genesis first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Latest committed block
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("genesis is created in `new`; the chain is never empty")
    }

    fn next_index(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Pending transactions in FIFO order
    pub fn pending(&self) -> &VecDeque<Transaction> {
        &self.pending
    }

    /// Registered app names
    pub fn app_names(&self) -> impl Iterator<Item = &str> {
        self.apps.names()
    }

    /// Typed view of an app's state
    ///
    /// `None` if the app is unknown or `S` is not its state type.
    pub fn app_state<S: 'static>(&self, app: &str) -> Option<&S> {
        self.apps.get(app)?.state_any().downcast_ref::<S>()
    }

    /// JSON snapshot of an app's state
    pub fn app_state_json(&self, app: &str) -> Result<Option<Value>> {
        match self.apps.get(app) {
            Some(hosted) => hosted.state_json().map(Some),
            None => Ok(None),
        }
    }

    /// Ledger metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
