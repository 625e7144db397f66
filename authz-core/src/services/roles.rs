//! Role service - role CRUD, bindings, assignments, and direct grants.
//!
//! All grant administration goes through here: role-permission bindings and
//! direct user grants share the registry validation and the idempotency
//! rules (re-adding is a no-op, removing the absent is a no-op).

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{
    AuditAction, AuditRecord, Role, RoleBinding, Scope, UserPermissionGrant, UserRoleAssignment,
    GLOBAL_CONTEXT_TYPE,
};
use crate::services::audit::{record_best_effort, AuditSink};
use crate::services::registry::PermissionRegistry;
use crate::store::Store;

#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn Store>,
    registry: PermissionRegistry,
    audit: Arc<dyn AuditSink>,
}

impl RoleService {
    pub fn new(
        store: Arc<dyn Store>,
        registry: PermissionRegistry,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            registry,
            audit,
        }
    }

    /// Create a role valid for one context type. Names are unique per type.
    pub async fn create_role(&self, name: &str, context_type: &str) -> Result<Role, AuthzError> {
        if name.trim().is_empty() {
            return Err(AuthzError::invalid_input("role name must not be empty"));
        }
        if context_type.trim().is_empty() {
            return Err(AuthzError::invalid_input("context type must not be empty"));
        }

        let role = Role::new(name.to_string(), context_type.to_string());
        if !self.store.insert_role(&role).await? {
            return Err(AuthzError::Conflict(format!(
                "role '{}' already exists for context type '{}'",
                name, context_type
            )));
        }

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                None,
                AuditAction::RoleCreated,
                true,
                serde_json::json!({ "role": name, "context_type": context_type }),
            ),
        )
        .await;

        Ok(role)
    }

    pub async fn get_role(&self, name: &str, context_type: &str) -> Result<Role, AuthzError> {
        self.store
            .find_role_by_name(name, context_type)
            .await?
            .ok_or_else(|| AuthzError::NotFound(format!("role '{}'", name)))
    }

    /// Delete a role and cascade all of its bindings and assignments.
    /// The cascade is transactional: all rows go or none do.
    pub async fn delete_role(&self, name: &str, context_type: &str) -> Result<(), AuthzError> {
        let role = self.get_role(name, context_type).await?;
        self.store.delete_role_cascade(role.role_id).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                None,
                AuditAction::RoleDeleted,
                true,
                serde_json::json!({ "role": name, "context_type": context_type }),
            ),
        )
        .await;

        Ok(())
    }

    /// Assign a role to a user within a concrete context, or globally when
    /// `context_id` is absent.
    ///
    /// The requested context type must equal the role's declared type, and
    /// when a context id is supplied its stored type must agree as well;
    /// either disagreement is a `TypeMismatch` naming both types.
    pub async fn assign_role_to_user(
        &self,
        role_id: Uuid,
        user_id: Uuid,
        context_id: Option<Uuid>,
        context_type: &str,
    ) -> Result<UserRoleAssignment, AuthzError> {
        let role = self
            .store
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("role"))?;
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("user"))?;

        if role.context_type != context_type {
            return Err(AuthzError::TypeMismatch {
                declared: role.context_type,
                requested: context_type.to_string(),
            });
        }

        match context_id {
            Some(context_id) => {
                let context = self
                    .store
                    .find_context_by_id(context_id)
                    .await?
                    .ok_or_else(|| AuthzError::not_found("context"))?;
                if context.context_type != context_type {
                    return Err(AuthzError::TypeMismatch {
                        declared: context.context_type,
                        requested: context_type.to_string(),
                    });
                }
            }
            None => {
                if role.context_type != GLOBAL_CONTEXT_TYPE {
                    return Err(AuthzError::invalid_input(format!(
                        "role '{}' has context type '{}' and cannot be assigned without a context",
                        role.name, role.context_type
                    )));
                }
            }
        }

        let assignment =
            UserRoleAssignment::new(user_id, role_id, context_id, context_type.to_string());
        self.store.upsert_assignment(&assignment).await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(user_id),
                context_id,
                AuditAction::RoleAssigned,
                true,
                serde_json::json!({ "role": role.name, "context_type": context_type }),
            ),
        )
        .await;

        Ok(assignment)
    }

    /// Bind a permission to a role at a scope tier. Idempotent; the key must
    /// be declared in the registry.
    pub async fn add_permission_to_role(
        &self,
        role_id: Uuid,
        permission_key: &str,
        scope: Scope,
    ) -> Result<(), AuthzError> {
        self.store
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("role"))?;
        self.registry.require_declared(permission_key).await?;

        self.store
            .upsert_role_binding(&RoleBinding::new(
                role_id,
                permission_key.to_string(),
                scope.clone(),
            ))
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                None,
                None,
                AuditAction::PermissionBound,
                true,
                serde_json::json!({ "role_id": role_id, "permission": permission_key, "scope": scope }),
            ),
        )
        .await;

        Ok(())
    }

    /// Remove a binding. Removing one that does not exist is a no-op.
    pub async fn remove_permission_from_role(
        &self,
        role_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<(), AuthzError> {
        let removed = self
            .store
            .delete_role_binding(role_id, permission_key, scope)
            .await?;

        if removed {
            record_best_effort(
                self.audit.as_ref(),
                AuditRecord::new(
                    None,
                    None,
                    AuditAction::PermissionUnbound,
                    true,
                    serde_json::json!({ "role_id": role_id, "permission": permission_key }),
                ),
            )
            .await;
        }

        Ok(())
    }

    /// Grant a permission directly to a user, bypassing roles. Idempotent;
    /// the key must be declared in the registry.
    pub async fn grant_permission_to_user(
        &self,
        user_id: Uuid,
        permission_key: &str,
        scope: Scope,
    ) -> Result<(), AuthzError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("user"))?;
        self.registry.require_declared(permission_key).await?;

        self.store
            .upsert_grant(&UserPermissionGrant::new(
                user_id,
                permission_key.to_string(),
                scope.clone(),
            ))
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(user_id),
                None,
                AuditAction::GrantAdded,
                true,
                serde_json::json!({ "permission": permission_key, "scope": scope }),
            ),
        )
        .await;

        Ok(())
    }

    /// Revoke a direct grant. Revoking one that does not exist is a no-op.
    pub async fn revoke_permission_from_user(
        &self,
        user_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<(), AuthzError> {
        let removed = self.store.delete_grant(user_id, permission_key, scope).await?;

        if removed {
            record_best_effort(
                self.audit.as_ref(),
                AuditRecord::new(
                    Some(user_id),
                    None,
                    AuditAction::GrantRemoved,
                    true,
                    serde_json::json!({ "permission": permission_key }),
                ),
            )
            .await;
        }

        Ok(())
    }
}
