//! Where an [`InterruptManager`][super::manager::InterruptManager] records
//! interrupts it has raised, independent of the oneshot waiter it hands back
//! to the caller, so a dashboard or audit log can list pending interrupts
//! without holding the waiter itself.
//!
//! A durable implementation (backing this with a real database) is out of
//! scope; [`InMemoryInterruptStore`] is sufficient for tests and is what the
//! crate exercises itself against.

use async_trait::async_trait;
use dashmap::DashMap;

use super::interrupt::{Interrupt, InterruptStatus};

#[async_trait]
pub trait InterruptStore: Send + Sync {
    async fn save(&self, interrupt: Interrupt);
    async fn load(&self, id: &str) -> Option<Interrupt>;
    /// Lists interrupts, optionally filtered by workflow id and/or status.
    async fn list(&self, workflow_id: Option<&str>, status: Option<InterruptStatus>) -> Vec<Interrupt>;
    /// Overwrites a previously-saved interrupt (e.g. after its status changes).
    async fn update(&self, interrupt: Interrupt);
}

/// A process-local, `DashMap`-backed [`InterruptStore`].
#[derive(Default)]
pub struct InMemoryInterruptStore {
    interrupts: DashMap<String, Interrupt>,
}

impl InMemoryInterruptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterruptStore for InMemoryInterruptStore {
    async fn save(&self, interrupt: Interrupt) {
        self.interrupts.insert(interrupt.id.clone(), interrupt);
    }

    async fn load(&self, id: &str) -> Option<Interrupt> {
        self.interrupts.get(id).map(|e| e.value().clone())
    }

    async fn list(&self, workflow_id: Option<&str>, status: Option<InterruptStatus>) -> Vec<Interrupt> {
        self.interrupts
            .iter()
            .map(|e| e.value().clone())
            .filter(|i| workflow_id.is_none_or(|w| i.workflow_id == w))
            .filter(|i| status.is_none_or(|s| i.status == s))
            .collect()
    }

    async fn update(&self, interrupt: Interrupt) {
        self.interrupts.insert(interrupt.id.clone(), interrupt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hitl::interrupt::InterruptKind;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::time::Duration;

    fn sample(id: &str, workflow_id: &str, status: InterruptStatus) -> Interrupt {
        Interrupt {
            id: id.to_string(),
            workflow_id: workflow_id.to_string(),
            node_id: "node-1".to_string(),
            kind: InterruptKind::Approval,
            status,
            title: "t".to_string(),
            description: "d".to_string(),
            data: serde_json::Value::Null,
            options: Vec::new(),
            input_schema: None,
            response: None,
            created_at: Utc::now(),
            resolved_at: None,
            timeout: Duration::from_secs(60),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn list_filters_by_workflow_id_and_status() {
        let store = InMemoryInterruptStore::new();
        store.save(sample("a", "wf-1", InterruptStatus::Pending)).await;
        store.save(sample("b", "wf-1", InterruptStatus::Resolved)).await;
        store.save(sample("c", "wf-2", InterruptStatus::Pending)).await;

        let wf1_pending = store.list(Some("wf-1"), Some(InterruptStatus::Pending)).await;
        assert_eq!(wf1_pending.len(), 1);
        assert_eq!(wf1_pending[0].id, "a");

        let all_wf1 = store.list(Some("wf-1"), None).await;
        assert_eq!(all_wf1.len(), 2);

        let all_pending = store.list(None, Some(InterruptStatus::Pending)).await;
        assert_eq!(all_pending.len(), 2);
    }

    #[tokio::test]
    async fn update_overwrites_the_existing_entry() {
        let store = InMemoryInterruptStore::new();
        store.save(sample("a", "wf-1", InterruptStatus::Pending)).await;
        let mut updated = store.load("a").await.unwrap();
        updated.status = InterruptStatus::Timeout;
        store.update(updated).await;

        assert_eq!(store.load("a").await.unwrap().status, InterruptStatus::Timeout);
    }
}
