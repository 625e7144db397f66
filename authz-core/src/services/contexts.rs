//! Context service - the forest of scoping units.
//!
//! Context types are immutable after creation; no operation here exposes a
//! type change. Reparenting walks the ancestor chain of the new parent to
//! reject cycles.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{AuditAction, AuditRecord, Context};
use crate::services::audit::{record_best_effort, AuditSink};
use crate::store::Store;

#[derive(Clone)]
pub struct ContextService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditSink>,
}

impl ContextService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Create a context of a given type, optionally under a parent.
    pub async fn create_context(
        &self,
        context_type: &str,
        parent_context_id: Option<Uuid>,
    ) -> Result<Context, AuthzError> {
        if context_type.trim().is_empty() {
            return Err(AuthzError::invalid_input("context type must not be empty"));
        }
        if let Some(parent_id) = parent_context_id {
            self.store
                .find_context_by_id(parent_id)
                .await?
                .ok_or_else(|| AuthzError::not_found("parent context"))?;
        }

        let context = Context::new(context_type.to_string(), parent_context_id);
        self.store.insert_context(&context).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                Some(context.context_id),
                AuditAction::ContextCreated,
                true,
                serde_json::json!({ "context_type": context_type, "parent": parent_context_id }),
            ),
        )
        .await;

        Ok(context)
    }

    pub async fn get_context(&self, context_id: Uuid) -> Result<Context, AuthzError> {
        self.store
            .find_context_by_id(context_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("context"))
    }

    pub async fn children(&self, context_id: Uuid) -> Result<Vec<Context>, AuthzError> {
        self.store.find_child_contexts(context_id).await
    }

    /// Move a context under a new parent (or to the root when `None`).
    ///
    /// Rejects self-parenting and any move that would close a cycle through
    /// the parent chain.
    pub async fn reparent_context(
        &self,
        context_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> Result<Context, AuthzError> {
        self.get_context(context_id).await?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == context_id {
                return Err(AuthzError::invalid_input(
                    "context cannot be its own parent",
                ));
            }
            // Walk up from the proposed parent; hitting ourselves means the
            // move would close a cycle. Stored data may already contain one
            // (written by a racing reparent), so track visited ids too.
            let mut visited = HashSet::new();
            let mut cursor = Some(parent_id);
            while let Some(current) = cursor {
                if current == context_id {
                    return Err(AuthzError::invalid_input(
                        "reparenting would create a cycle in the context chain",
                    ));
                }
                if !visited.insert(current) {
                    return Err(AuthzError::invalid_input(
                        "context parent chain already contains a cycle",
                    ));
                }
                let ancestor = self
                    .store
                    .find_context_by_id(current)
                    .await?
                    .ok_or_else(|| AuthzError::not_found("parent context"))?;
                cursor = ancestor.parent_context_id;
            }
        }

        self.store
            .update_context_parent(context_id, new_parent_id)
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                Some(context_id),
                AuditAction::ContextReparented,
                true,
                serde_json::json!({ "new_parent": new_parent_id }),
            ),
        )
        .await;

        self.get_context(context_id).await
    }
}
