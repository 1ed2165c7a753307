//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the state machine.
//!
//! # Metrics
//!
//! - `ledger_txs_total{mode,result}` - Transactions by check/deliver mode and result category
//! - `ledger_rewards_issued_total` - Matured posts paid out
//! - `ledger_blocks_committed_total` - Committed blocks
//!
//! Each collector owns its registry, so any number of engines can coexist in
//! one process.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions by mode and result
    pub txs_total: IntCounterVec,

    /// Matured posts paid
    pub rewards_issued: IntCounter,

    /// Committed blocks
    pub blocks_committed: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let txs_total = IntCounterVec::new(
            Opts::new("ledger_txs_total", "Transactions processed by mode and result"),
            &["mode", "result"],
        )?;
        registry.register(Box::new(txs_total.clone()))?;

        let rewards_issued = IntCounter::new(
            "ledger_rewards_issued_total",
            "Matured posts whose reward was paid out",
        )?;
        registry.register(Box::new(rewards_issued.clone()))?;

        let blocks_committed =
            IntCounter::new("ledger_blocks_committed_total", "Total committed blocks")?;
        registry.register(Box::new(blocks_committed.clone()))?;

        Ok(Self {
            txs_total,
            rewards_issued,
            blocks_committed,
            registry,
        })
    }

    /// Record one transaction outcome
    pub fn record_tx(&self, mode: &str, result: &str) {
        self.txs_total.with_label_values(&[mode, result]).inc();
    }

    /// Record matured rewards paid
    pub fn record_rewards_issued(&self, count: u64) {
        self.rewards_issued.inc_by(count);
    }

    /// Record block commit
    pub fn record_block_committed(&self) {
        self.blocks_committed.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every metric
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("rewards_issued", &self.rewards_issued.get())
            .field("blocks_committed", &self.blocks_committed.get())
            .finish()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.rewards_issued.get(), 0);
        assert_eq!(metrics.blocks_committed.get(), 0);
    }

    #[test]
    fn test_two_collectors_coexist() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_block_committed();
        assert_eq!(a.blocks_committed.get(), 1);
        assert_eq!(b.blocks_committed.get(), 0);
    }

    #[test]
    fn test_record_tx_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_tx("deliver", "ok");
        metrics.record_tx("deliver", "ok");
        metrics.record_tx("check", "invalid_sequence");

        assert_eq!(
            metrics.txs_total.with_label_values(&["deliver", "ok"]).get(),
            2
        );
        assert!(metrics.render().contains("ledger_txs_total"));
    }
}
