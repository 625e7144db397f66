//! Persistence boundary.
//!
//! Every service talks to a `Store`; the trait is the whole contract the
//! core places on its storage engine: CRUD over the model entities, a
//! unique-constraint upsert on the revocation ledger, and an atomic cascade
//! for role deletion. `PgStore` is the production implementation;
//! `MemoryStore` backs the test suites and embedded use.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{
    AuditRecord, Context, Permission, RevokedToken, Role, RoleBinding, Scope, User,
    UserPermissionGrant, UserRoleAssignment,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Users ====================

    async fn insert_user(&self, user: &User) -> Result<(), AuthzError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthzError>;

    /// Returns false when the user does not exist.
    async fn update_user_credential(
        &self,
        user_id: Uuid,
        credential_hash: &str,
    ) -> Result<bool, AuthzError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AuthzError>;

    /// Whether grants, assignments or audit rows still reference the user.
    async fn user_has_references(&self, user_id: Uuid) -> Result<bool, AuthzError>;

    // ==================== Contexts ====================

    async fn insert_context(&self, context: &Context) -> Result<(), AuthzError>;

    async fn find_context_by_id(&self, context_id: Uuid) -> Result<Option<Context>, AuthzError>;

    async fn find_child_contexts(&self, parent_id: Uuid) -> Result<Vec<Context>, AuthzError>;

    /// Returns false when the context does not exist. Never changes the type.
    async fn update_context_parent(
        &self,
        context_id: Uuid,
        parent_context_id: Option<Uuid>,
    ) -> Result<bool, AuthzError>;

    // ==================== Permission registry ====================

    /// Returns false when the key is already declared.
    async fn insert_permission(&self, permission: &Permission) -> Result<bool, AuthzError>;

    async fn find_permission(&self, permission_key: &str)
        -> Result<Option<Permission>, AuthzError>;

    // ==================== Roles ====================

    /// Returns false when a role with the same (name, context_type) exists.
    async fn insert_role(&self, role: &Role) -> Result<bool, AuthzError>;

    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, AuthzError>;

    async fn find_role_by_name(
        &self,
        name: &str,
        context_type: &str,
    ) -> Result<Option<Role>, AuthzError>;

    /// Removes the role plus all of its bindings and assignments atomically.
    async fn delete_role_cascade(&self, role_id: Uuid) -> Result<(), AuthzError>;

    // ==================== Role bindings ====================

    /// Idempotent: re-inserting an existing binding is a no-op.
    async fn upsert_role_binding(&self, binding: &RoleBinding) -> Result<(), AuthzError>;

    /// Returns false when no matching binding existed.
    async fn delete_role_binding(
        &self,
        role_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError>;

    /// Bindings of one role for one permission key (hot check path).
    async fn find_role_bindings(
        &self,
        role_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<RoleBinding>, AuthzError>;

    // ==================== Role assignments ====================

    /// Idempotent: re-assigning an identical row is a no-op.
    async fn upsert_assignment(&self, assignment: &UserRoleAssignment) -> Result<(), AuthzError>;

    async fn find_assignments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserRoleAssignment>, AuthzError>;

    // ==================== Direct grants ====================

    /// Idempotent: double-granting leaves exactly one row.
    async fn upsert_grant(&self, grant: &UserPermissionGrant) -> Result<(), AuthzError>;

    /// Returns false when no matching grant existed (revoking a non-existent
    /// grant is a no-op for callers).
    async fn delete_grant(
        &self,
        user_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError>;

    /// Direct grants of one user for one permission key (hot check path).
    async fn find_grants_for_user(
        &self,
        user_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<UserPermissionGrant>, AuthzError>;

    // ==================== Revocation ledger ====================

    /// Unique-constraint upsert keyed by jti. Returns true when the row was
    /// newly inserted, false when the jti was already revoked. Refresh
    /// rotation atomicity rides entirely on this primitive.
    async fn insert_revoked_token(&self, token: &RevokedToken) -> Result<bool, AuthzError>;

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, AuthzError>;

    // ==================== Audit ====================

    async fn append_audit(&self, record: &AuditRecord) -> Result<(), AuthzError>;
}
