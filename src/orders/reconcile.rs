//! Repair of restaurant counters for orders whose stats update did not land

use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::error::AppResult;
use crate::storage::Storage;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Orders found with `statsApplied = false`
    pub scanned: usize,
    /// Orders whose counters were applied by this run
    pub applied: usize,
    /// Orders that still could not be applied
    pub failed: usize,
}

#[derive(Clone)]
pub struct Reconciler {
    storage: Storage,
}

impl Reconciler {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Apply outstanding counters. Each order is applied at most once.
    pub async fn reconcile(&self) -> AppResult<ReconcileReport> {
        let pending = self.storage.orders.unapplied_stats().await?;
        let mut report = ReconcileReport {
            scanned: pending.len(),
            ..Default::default()
        };

        for order in pending {
            match self.storage.orders.apply_stats(&order.id).await {
                Ok(true) => {
                    report.applied += 1;
                    tracing::info!(order_id = %order.id, order_code = %order.order_code, "restaurant stats reconciled");
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(order_id = %order.id, error = %e, "stats reconciliation failed");
                }
            }
        }

        Ok(report)
    }

    /// Run [`reconcile`](Self::reconcile) every `interval`
    pub fn spawn_periodic(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.reconcile().await {
                    Ok(report) if report.scanned > 0 => {
                        tracing::info!(?report, "periodic stats reconciliation");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "periodic stats reconciliation failed"),
                }
            }
        })
    }
}
