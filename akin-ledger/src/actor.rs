//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`Ledger`]; no locks are needed
//! - Intake and proposal never interleave, so a proposal drains and (on
//!   failure) restores the pending pool as one unit
//! - Async message passing with backpressure (bounded mailbox)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        Drivers (CLI, RPC front-ends, tests)           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   add_transaction | propose_block | is_valid_chain    │
//! │                       │                               │
//! │                       ▼                               │
//! │          App::validate / App::apply                   │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::types::Block;
use crate::{Error, Ledger, Result, Transaction};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Submit a transaction
    AddTransaction {
        /// Transaction to validate and queue
        tx: Transaction,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Propose a block
    ProposeBlock {
        /// Proposing validator
        validator: String,
        /// Reply channel (new block index)
        response: oneshot::Sender<Result<u64>>,
    },

    /// Verify the whole chain
    IsValidChain {
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Snapshot of committed blocks
    GetBlocks {
        /// Reply channel
        response: oneshot::Sender<Vec<Block>>,
    },

    /// JSON snapshot of one app's state
    GetAppState {
        /// App name
        app: String,
        /// Reply channel
        response: oneshot::Sender<Result<Option<Value>>>,
    },

    /// Number of pending transactions
    GetPendingLen {
        /// Reply channel
        response: oneshot::Sender<usize>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// Owned ledger state
    ledger: Ledger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: Ledger, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { ledger, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => {
                    tracing::info!(
                        height = self.ledger.tip().index(),
                        pending = self.ledger.pending().len(),
                        "Ledger actor shutting down"
                    );
                    break;
                }
                _ => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        // A dropped reply receiver means the caller gave up; nothing to do.
        match msg {
            LedgerMessage::AddTransaction { tx, response } => {
                let _ = response.send(self.ledger.add_transaction(tx));
            }

            LedgerMessage::ProposeBlock { validator, response } => {
                let _ = response.send(self.ledger.propose_block(&validator));
            }

            LedgerMessage::IsValidChain { response } => {
                let _ = response.send(self.ledger.is_valid_chain());
            }

            LedgerMessage::GetBlocks { response } => {
                let _ = response.send(self.ledger.blocks().to_vec());
            }

            LedgerMessage::GetAppState { app, response } => {
                let _ = response.send(self.ledger.app_state_json(&app));
            }

            LedgerMessage::GetPendingLen { response } => {
                let _ = response.send(self.ledger.pending().len());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a transaction
    pub async fn add_transaction(&self, tx: Transaction) -> Result<()> {
        self.request(|response| LedgerMessage::AddTransaction { tx, response })
            .await?
    }

    /// Propose a block
    pub async fn propose_block(&self, validator: impl Into<String>) -> Result<u64> {
        let validator = validator.into();
        self.request(|response| LedgerMessage::ProposeBlock { validator, response })
            .await?
    }

    /// Verify the whole chain
    pub async fn is_valid_chain(&self) -> Result<()> {
        self.request(|response| LedgerMessage::IsValidChain { response })
            .await?
    }

    /// Snapshot of committed blocks
    pub async fn blocks(&self) -> Result<Vec<Block>> {
        self.request(|response| LedgerMessage::GetBlocks { response })
            .await
    }

    /// JSON snapshot of one app's state
    pub async fn app_state(&self, app: impl Into<String>) -> Result<Option<Value>> {
        let app = app.into();
        self.request(|response| LedgerMessage::GetAppState { app, response })
            .await?
    }

    /// Number of pending transactions
    pub async fn pending_len(&self) -> Result<usize> {
        self.request(|response| LedgerMessage::GetPendingLen { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(ledger: Ledger, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
