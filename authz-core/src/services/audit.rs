//! Audit sink - write-only consumer of decision and lifecycle records.
//!
//! The sink is fire-and-forget from the core's perspective: a failing sink
//! is surfaced to operators through the error log but never fails the
//! primary operation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AuthzError;
use crate::models::AuditRecord;
use crate::store::Store;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), AuthzError>;
}

/// Record an audit row, swallowing (and logging) sink failures.
pub async fn record_best_effort(sink: &dyn AuditSink, record: AuditRecord) {
    let action = record.action.clone();
    if let Err(e) = sink.record(record).await {
        tracing::error!(error = %e, action = %action, "Failed to write audit record");
    }
}

/// Sink that only emits a structured log line.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuthzError> {
        tracing::info!(
            action = %record.action,
            actor_id = ?record.actor_id,
            context_id = ?record.context_id,
            success = record.success,
            metadata = %record.metadata,
            "audit"
        );
        Ok(())
    }
}

/// Sink that appends to the persistent store's audit table.
pub struct StoreAuditSink {
    store: Arc<dyn Store>,
}

impl StoreAuditSink {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuthzError> {
        self.store.append_audit(&record).await
    }
}

/// In-memory sink for tests asserting on emitted records.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuthzError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditAction;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _record: AuditRecord) -> Result<(), AuthzError> {
            Err(AuthzError::StoreUnavailable(anyhow::anyhow!("sink down")))
        }
    }

    #[tokio::test]
    async fn best_effort_swallows_sink_failure() {
        let record = AuditRecord::new(
            None,
            None,
            AuditAction::PermissionCheck,
            false,
            serde_json::json!({}),
        );
        // Must not panic or propagate.
        record_best_effort(&FailingSink, record).await;
    }

    #[tokio::test]
    async fn memory_sink_retains_records_in_order() {
        let sink = MemoryAuditSink::new();
        for success in [true, false] {
            sink.record(AuditRecord::new(
                None,
                None,
                AuditAction::TokenIssued,
                success,
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        }
        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert!(!records[1].success);
    }
}
