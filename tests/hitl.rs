//! Integration tests for the human-in-the-loop interrupt path, exercised
//! only through the public `bistream::hitl` API.

use std::sync::Arc;
use std::time::Duration;

use bistream::error::InterruptError;
use bistream::hitl::{
    CreateInterruptOptions, InMemoryInterruptStore, InterruptKind, InterruptManager, InterruptStatus,
    InterruptStore, Response,
};

fn manager() -> Arc<InterruptManager> {
    Arc::new(InterruptManager::new(Arc::new(InMemoryInterruptStore::new())))
}

fn approval_opts(timeout: Duration) -> CreateInterruptOptions {
    CreateInterruptOptions::new("wf-1", "review-node", InterruptKind::Approval)
        .with_title("allow this action?")
        .with_timeout(timeout)
}

/// S6: a reviewer resolving an interrupt unblocks the caller with the
/// reviewer's response, and the stored record reflects the resolution.
#[tokio::test]
async fn s6_resolve_unblocks_the_waiter_with_the_response() {
    let manager = manager();
    let creator = manager.clone();
    let waiter = tokio::spawn(async move {
        creator
            .create_interrupt(approval_opts(Duration::from_secs(5)))
            .await
    });

    // Simulate a reviewer acting on the interrupt from a different task.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let pending = manager.get_pending(Some("wf-1")).await;
    assert_eq!(pending.len(), 1);
    let id = pending[0].id.clone();

    manager
        .resolve_interrupt(&id, Response::approval(true).with_comment("looks good"))
        .await
        .unwrap();

    let response = waiter.await.unwrap().unwrap();
    assert!(response.approved);
    assert_eq!(response.comment.as_deref(), Some("looks good"));
    assert!(manager.get_pending(None).await.is_empty());
}

/// S7: an unresolved interrupt times out instead of hanging forever, and the
/// stored record's status moves to `Timeout`.
#[tokio::test]
async fn s7_unresolved_interrupt_times_out() {
    let manager = manager();
    let result = manager
        .create_interrupt(approval_opts(Duration::from_millis(20)))
        .await;
    assert!(matches!(result, Err(InterruptError::Timeout)));
}

#[tokio::test]
async fn zero_timeout_is_normalized_to_the_24_hour_default() {
    let manager = manager();
    let creator = manager.clone();
    let waiter = tokio::spawn(async move {
        creator
            .create_interrupt(approval_opts(Duration::ZERO))
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let pending = manager.get_pending(Some("wf-1")).await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].timeout, Duration::from_secs(24 * 60 * 60));

    manager
        .resolve_interrupt(&pending[0].id, Response::approval(true))
        .await
        .unwrap();
    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn cancelling_an_interrupt_fails_the_waiter_distinctly_from_a_timeout() {
    let manager = manager();
    let creator = manager.clone();
    let waiter = tokio::spawn(async move {
        creator
            .create_interrupt(approval_opts(Duration::from_secs(5)))
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let id = manager.get_pending(Some("wf-1")).await[0].id.clone();
    manager.cancel_interrupt(&id).await.unwrap();

    let result = waiter.await.unwrap();
    assert!(matches!(result, Err(InterruptError::Cancelled)));
}

/// Invariant 7: a rejected (not approved) response lands the interrupt on
/// `Rejected`, distinct from an approved resolution.
#[tokio::test]
async fn a_rejected_response_is_recorded_as_rejected_not_resolved() {
    let manager = manager();
    let creator = manager.clone();
    let waiter = tokio::spawn(async move {
        creator
            .create_interrupt(approval_opts(Duration::from_secs(5)))
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let id = manager.get_pending(Some("wf-1")).await[0].id.clone();
    manager
        .resolve_interrupt(&id, Response::approval(false))
        .await
        .unwrap();
    waiter.await.unwrap().unwrap();

    let all = manager.get_pending(None).await;
    assert!(all.is_empty(), "resolved interrupts are no longer pending");
}

/// Invariant 6/7: only one waiter can ever exist per interrupt id, and a
/// second resolve for the same id is rejected once the first has landed.
#[tokio::test]
async fn at_most_one_resolution_lands_per_interrupt_id() {
    let manager = manager();
    let creator = manager.clone();
    let waiter = tokio::spawn(async move {
        creator
            .create_interrupt(approval_opts(Duration::from_secs(5)))
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let id = manager.get_pending(Some("wf-1")).await[0].id.clone();

    let first = manager.resolve_interrupt(&id, Response::approval(true)).await;
    let second = manager.resolve_interrupt(&id, Response::approval(false)).await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(InterruptError::NotFound(_))));
    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn get_pending_is_scoped_by_workflow_id() {
    let manager = manager();
    let c1 = manager.clone();
    let waiter_a = tokio::spawn(async move {
        c1.create_interrupt(
            CreateInterruptOptions::new("wf-a", "node", InterruptKind::Input)
                .with_timeout(Duration::from_secs(5)),
        )
        .await
    });
    let c2 = manager.clone();
    let waiter_b = tokio::spawn(async move {
        c2.create_interrupt(
            CreateInterruptOptions::new("wf-b", "node", InterruptKind::Input)
                .with_timeout(Duration::from_secs(5)),
        )
        .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.get_pending(Some("wf-a")).await.len(), 1);
    assert_eq!(manager.get_pending(Some("wf-b")).await.len(), 1);
    assert_eq!(manager.get_pending(None).await.len(), 2);

    for wf in ["wf-a", "wf-b"] {
        let id = manager.get_pending(Some(wf)).await[0].id.clone();
        manager
            .resolve_interrupt(&id, Response::approval(true))
            .await
            .unwrap();
    }
    waiter_a.await.unwrap().unwrap();
    waiter_b.await.unwrap().unwrap();
}

#[tokio::test]
async fn store_reflects_terminal_status_after_timeout() {
    let store = Arc::new(InMemoryInterruptStore::new());
    let manager = Arc::new(InterruptManager::new(store.clone()));

    let result = manager
        .create_interrupt(approval_opts(Duration::from_millis(15)))
        .await;
    assert!(result.is_err());

    let recorded = store.list(Some("wf-1"), Some(InterruptStatus::Timeout)).await;
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].resolved_at.is_some());
}
