//! Context forest and principal lifecycle tests.

mod common;

use authz_core::models::{Context, Scope};
use authz_core::store::Store;
use authz_core::AuthzError;
use common::Harness;
use uuid::Uuid;

#[tokio::test]
async fn contexts_form_a_forest_with_children() {
    let h = Harness::new();
    let org = h.context("org").await;
    let team_a = h
        .contexts
        .create_context("team", Some(org.context_id))
        .await
        .unwrap();
    let team_b = h
        .contexts
        .create_context("team", Some(org.context_id))
        .await
        .unwrap();

    assert!(org.is_root());
    assert!(!team_a.is_root());

    let mut children: Vec<Uuid> = h
        .contexts
        .children(org.context_id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.context_id)
        .collect();
    children.sort();
    let mut expected = vec![team_a.context_id, team_b.context_id];
    expected.sort();
    assert_eq!(children, expected);
}

#[tokio::test]
async fn creating_under_a_missing_parent_fails() {
    let h = Harness::new();
    let result = h.contexts.create_context("team", Some(Uuid::new_v4())).await;
    assert!(matches!(result, Err(AuthzError::NotFound(_))));
}

#[tokio::test]
async fn empty_context_type_is_invalid() {
    let h = Harness::new();
    let result = h.contexts.create_context("  ", None).await;
    assert!(matches!(result, Err(AuthzError::InvalidInput(_))));
}

#[tokio::test]
async fn reparenting_rejects_cycles() {
    let h = Harness::new();
    let a = h.context("org").await;
    let b = h
        .contexts
        .create_context("team", Some(a.context_id))
        .await
        .unwrap();
    let c = h
        .contexts
        .create_context("project", Some(b.context_id))
        .await
        .unwrap();

    // a -> b -> c; moving a under c would close the loop.
    let cycle = h
        .contexts
        .reparent_context(a.context_id, Some(c.context_id))
        .await;
    assert!(matches!(cycle, Err(AuthzError::InvalidInput(_))));

    let self_parent = h
        .contexts
        .reparent_context(a.context_id, Some(a.context_id))
        .await;
    assert!(matches!(self_parent, Err(AuthzError::InvalidInput(_))));

    // A legal move: c becomes a direct child of a.
    let moved = h
        .contexts
        .reparent_context(c.context_id, Some(a.context_id))
        .await
        .unwrap();
    assert_eq!(moved.parent_context_id, Some(a.context_id));

    // Detaching to a root is also legal.
    let detached = h.contexts.reparent_context(b.context_id, None).await.unwrap();
    assert!(detached.is_root());
}

#[tokio::test]
async fn reparenting_onto_a_corrupt_parent_chain_errors_instead_of_looping() {
    let h = Harness::new();

    // A cycle the service never produces can still exist in stored data,
    // e.g. written by a racing reparent. Plant one directly in the store.
    let mut a = Context::new("team".to_string(), None);
    let b = Context::new("team".to_string(), Some(a.context_id));
    a.parent_context_id = Some(b.context_id);
    h.store.insert_context(&a).await.unwrap();
    h.store.insert_context(&b).await.unwrap();

    let c = h.context("team").await;
    let result = h
        .contexts
        .reparent_context(c.context_id, Some(a.context_id))
        .await;
    assert!(matches!(result, Err(AuthzError::InvalidInput(_))));
}

#[tokio::test]
async fn user_credential_updates_round_trip() {
    let h = Harness::new();
    let user = h.user().await;

    h.users
        .update_credential(user.user_id, "new-hash")
        .await
        .unwrap();
    let reloaded = h.users.get_user(user.user_id).await.unwrap();
    assert_eq!(reloaded.credential_hash, "new-hash");

    let missing = h.users.update_credential(Uuid::new_v4(), "hash").await;
    assert!(matches!(missing, Err(AuthzError::NotFound(_))));
}

#[tokio::test]
async fn user_deletion_is_rejected_while_referenced() {
    let h = Harness::new();
    let user = h.user().await;
    h.permission("example:read").await;
    h.roles
        .grant_permission_to_user(user.user_id, "example:read", Scope::Global)
        .await
        .unwrap();

    let blocked = h.users.delete_user(user.user_id).await;
    assert!(matches!(blocked, Err(AuthzError::Conflict(_))));

    // Dropping the last reference unblocks deletion.
    h.roles
        .revoke_permission_from_user(user.user_id, "example:read", &Scope::Global)
        .await
        .unwrap();
    h.users.delete_user(user.user_id).await.unwrap();

    assert!(matches!(
        h.users.get_user(user.user_id).await,
        Err(AuthzError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_missing_user_is_not_found() {
    let h = Harness::new();
    let result = h.users.delete_user(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AuthzError::NotFound(_))));
}
