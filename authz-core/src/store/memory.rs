//! In-memory store.
//!
//! One mutex over the whole state: every operation, including the role
//! deletion cascade, is atomic by construction. Backs the integration test
//! suites and embedded single-process use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{
    AuditRecord, Context, Permission, RevokedToken, Role, RoleBinding, Scope, User,
    UserPermissionGrant, UserRoleAssignment,
};
use crate::store::Store;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    contexts: HashMap<Uuid, Context>,
    permissions: HashMap<String, Permission>,
    roles: HashMap<Uuid, Role>,
    bindings: Vec<RoleBinding>,
    assignments: Vec<UserRoleAssignment>,
    grants: Vec<UserPermissionGrant>,
    revoked: HashMap<Uuid, RevokedToken>,
    audit: Vec<AuditRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the audit trail, for tests asserting on recorded rows.
    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.inner.lock().await.audit.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        inner.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthzError> {
        Ok(self.inner.lock().await.users.get(&user_id).cloned())
    }

    async fn update_user_credential(
        &self,
        user_id: Uuid,
        credential_hash: &str,
    ) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.credential_hash = credential_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AuthzError> {
        Ok(self.inner.lock().await.users.remove(&user_id).is_some())
    }

    async fn user_has_references(&self, user_id: Uuid) -> Result<bool, AuthzError> {
        let inner = self.inner.lock().await;
        let referenced = inner.assignments.iter().any(|a| a.user_id == user_id)
            || inner.grants.iter().any(|g| g.user_id == user_id)
            || inner.audit.iter().any(|r| r.actor_id == Some(user_id));
        Ok(referenced)
    }

    async fn insert_context(&self, context: &Context) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        inner.contexts.insert(context.context_id, context.clone());
        Ok(())
    }

    async fn find_context_by_id(&self, context_id: Uuid) -> Result<Option<Context>, AuthzError> {
        Ok(self.inner.lock().await.contexts.get(&context_id).cloned())
    }

    async fn find_child_contexts(&self, parent_id: Uuid) -> Result<Vec<Context>, AuthzError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contexts
            .values()
            .filter(|c| c.parent_context_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn update_context_parent(
        &self,
        context_id: Uuid,
        parent_context_id: Option<Uuid>,
    ) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        match inner.contexts.get_mut(&context_id) {
            Some(context) => {
                context.parent_context_id = parent_context_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_permission(&self, permission: &Permission) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        if inner.permissions.contains_key(&permission.permission_key) {
            return Ok(false);
        }
        inner
            .permissions
            .insert(permission.permission_key.clone(), permission.clone());
        Ok(true)
    }

    async fn find_permission(
        &self,
        permission_key: &str,
    ) -> Result<Option<Permission>, AuthzError> {
        Ok(self
            .inner
            .lock()
            .await
            .permissions
            .get(permission_key)
            .cloned())
    }

    async fn insert_role(&self, role: &Role) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner
            .roles
            .values()
            .any(|r| r.name == role.name && r.context_type == role.context_type);
        if duplicate {
            return Ok(false);
        }
        inner.roles.insert(role.role_id, role.clone());
        Ok(true)
    }

    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, AuthzError> {
        Ok(self.inner.lock().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(
        &self,
        name: &str,
        context_type: &str,
    ) -> Result<Option<Role>, AuthzError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .roles
            .values()
            .find(|r| r.name == name && r.context_type == context_type)
            .cloned())
    }

    async fn delete_role_cascade(&self, role_id: Uuid) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        inner.bindings.retain(|b| b.role_id != role_id);
        inner.assignments.retain(|a| a.role_id != role_id);
        inner.roles.remove(&role_id);
        Ok(())
    }

    async fn upsert_role_binding(&self, binding: &RoleBinding) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        if !inner.bindings.contains(binding) {
            inner.bindings.push(binding.clone());
        }
        Ok(())
    }

    async fn delete_role_binding(
        &self,
        role_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        let before = inner.bindings.len();
        inner.bindings.retain(|b| {
            !(b.role_id == role_id && b.permission_key == permission_key && b.scope == *scope)
        });
        Ok(inner.bindings.len() < before)
    }

    async fn find_role_bindings(
        &self,
        role_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<RoleBinding>, AuthzError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bindings
            .iter()
            .filter(|b| b.role_id == role_id && b.permission_key == permission_key)
            .cloned()
            .collect())
    }

    async fn upsert_assignment(&self, assignment: &UserRoleAssignment) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        if !inner.assignments.contains(assignment) {
            inner.assignments.push(assignment.clone());
        }
        Ok(())
    }

    async fn find_assignments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserRoleAssignment>, AuthzError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_grant(&self, grant: &UserPermissionGrant) -> Result<(), AuthzError> {
        let mut inner = self.inner.lock().await;
        if !inner.grants.contains(grant) {
            inner.grants.push(grant.clone());
        }
        Ok(())
    }

    async fn delete_grant(
        &self,
        user_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        let before = inner.grants.len();
        inner.grants.retain(|g| {
            !(g.user_id == user_id && g.permission_key == permission_key && g.scope == *scope)
        });
        Ok(inner.grants.len() < before)
    }

    async fn find_grants_for_user(
        &self,
        user_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<UserPermissionGrant>, AuthzError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .grants
            .iter()
            .filter(|g| g.user_id == user_id && g.permission_key == permission_key)
            .cloned()
            .collect())
    }

    async fn insert_revoked_token(&self, token: &RevokedToken) -> Result<bool, AuthzError> {
        let mut inner = self.inner.lock().await;
        if inner.revoked.contains_key(&token.jti) {
            return Ok(false);
        }
        inner.revoked.insert(token.jti, token.clone());
        Ok(true)
    }

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, AuthzError> {
        Ok(self.inner.lock().await.revoked.contains_key(&jti))
    }

    async fn append_audit(&self, record: &AuditRecord) -> Result<(), AuthzError> {
        self.inner.lock().await.audit.push(record.clone());
        Ok(())
    }
}
