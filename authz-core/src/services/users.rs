//! Principal lifecycle.
//!
//! Credential hashing lives with an external authenticator; this service
//! only stores the opaque hash. Deletion is rejected while grant,
//! assignment or audit rows still reference the user.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{AuditAction, AuditRecord, User};
use crate::services::audit::{record_best_effort, AuditSink};
use crate::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditSink>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn create_user(&self, credential_hash: &str) -> Result<User, AuthzError> {
        if credential_hash.trim().is_empty() {
            return Err(AuthzError::invalid_input(
                "credential hash must not be empty",
            ));
        }

        let user = User::new(credential_hash.to_string());
        self.store.insert_user(&user).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                None,
                AuditAction::UserCreated,
                true,
                serde_json::json!({ "user_id": user.user_id }),
            ),
        )
        .await;

        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AuthzError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("user"))
    }

    pub async fn update_credential(
        &self,
        user_id: Uuid,
        credential_hash: &str,
    ) -> Result<(), AuthzError> {
        if credential_hash.trim().is_empty() {
            return Err(AuthzError::invalid_input(
                "credential hash must not be empty",
            ));
        }
        if !self
            .store
            .update_user_credential(user_id, credential_hash)
            .await?
        {
            return Err(AuthzError::not_found("user"));
        }
        Ok(())
    }

    /// Hard-delete a user. Fails with `Conflict` while grants, assignments
    /// or audit rows still reference it.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthzError> {
        self.get_user(user_id).await?;

        if self.store.user_has_references(user_id).await? {
            return Err(AuthzError::Conflict(
                "user is still referenced by grants, role assignments or audit records"
                    .to_string(),
            ));
        }

        self.store.delete_user(user_id).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                None,
                AuditAction::UserDeleted,
                true,
                serde_json::json!({ "user_id": user_id }),
            ),
        )
        .await;

        Ok(())
    }
}
