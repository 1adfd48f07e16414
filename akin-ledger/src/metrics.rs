//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `akin_txs_accepted_total` - Transactions accepted into the pending pool
//! - `akin_txs_rejected_total` - Transactions rejected at intake
//! - `akin_blocks_total` - Blocks committed (genesis excluded)
//! - `akin_pending_txs` - Current pending pool size
//! - `akin_apply_duration_seconds` - Histogram of per-block apply latency

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so several ledgers can coexist in one
/// process.
#[derive(Clone)]
pub struct Metrics {
    /// Accepted transactions
    pub txs_accepted: IntCounter,

    /// Rejected transactions
    pub txs_rejected: IntCounter,

    /// Committed blocks
    pub blocks_total: IntCounter,

    /// Pending pool size
    pub pending: IntGauge,

    /// Apply duration histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let txs_accepted = IntCounter::new(
            "akin_txs_accepted_total",
            "Transactions accepted into the pending pool",
        )?;
        registry.register(Box::new(txs_accepted.clone()))?;

        let txs_rejected = IntCounter::new(
            "akin_txs_rejected_total",
            "Transactions rejected at intake",
        )?;
        registry.register(Box::new(txs_rejected.clone()))?;

        let blocks_total = IntCounter::new("akin_blocks_total", "Blocks committed")?;
        registry.register(Box::new(blocks_total.clone()))?;

        let pending = IntGauge::new("akin_pending_txs", "Current pending pool size")?;
        registry.register(Box::new(pending.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new(
                "akin_apply_duration_seconds",
                "Histogram of per-block apply latency",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            txs_accepted,
            txs_rejected,
            blocks_total,
            pending,
            apply_duration,
            registry,
        })
    }

    /// Record an accepted transaction
    pub fn record_accepted(&self, pending_len: usize) {
        self.txs_accepted.inc();
        self.set_pending(pending_len);
    }

    /// Record a rejected transaction
    pub fn record_rejected(&self) {
        self.txs_rejected.inc();
    }

    /// Record a committed block
    pub fn record_block_committed(&self, apply_seconds: f64) {
        self.blocks_total.inc();
        self.apply_duration.observe(apply_seconds);
    }

    /// Update pending pool size
    pub fn set_pending(&self, pending_len: usize) {
        self.pending.set(i64::try_from(pending_len).unwrap_or(i64::MAX));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("txs_accepted", &self.txs_accepted.get())
            .field("txs_rejected", &self.txs_rejected.get())
            .field("blocks_total", &self.blocks_total.get())
            .field("pending", &self.pending.get())
            .finish()
    }
}
