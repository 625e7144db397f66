//! Audit record model - append-only decision and lifecycle trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Audited actions emitted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PermissionCheck,
    TokenIssued,
    TokenRefreshed,
    TokenRevoked,
    TokenRejected,
    RoleCreated,
    RoleDeleted,
    RoleAssigned,
    PermissionBound,
    PermissionUnbound,
    GrantAdded,
    GrantRemoved,
    ContextCreated,
    ContextReparented,
    UserCreated,
    UserDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PermissionCheck => "permission.check",
            AuditAction::TokenIssued => "token.issue",
            AuditAction::TokenRefreshed => "token.refresh",
            AuditAction::TokenRevoked => "token.revoke",
            AuditAction::TokenRejected => "token.reject",
            AuditAction::RoleCreated => "role.create",
            AuditAction::RoleDeleted => "role.delete",
            AuditAction::RoleAssigned => "role.assign",
            AuditAction::PermissionBound => "role.bind_permission",
            AuditAction::PermissionUnbound => "role.unbind_permission",
            AuditAction::GrantAdded => "grant.add",
            AuditAction::GrantRemoved => "grant.remove",
            AuditAction::ContextCreated => "context.create",
            AuditAction::ContextReparented => "context.reparent",
            AuditAction::UserCreated => "user.create",
            AuditAction::UserDeleted => "user.delete",
        }
    }
}

/// One append-only audit row. Never mutated or deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub context_id: Option<Uuid>,
    pub action: String,
    pub success: bool,
    pub metadata: serde_json::Value,
    pub created_utc: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        actor_id: Option<Uuid>,
        context_id: Option<Uuid>,
        action: AuditAction,
        success: bool,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            actor_id,
            context_id,
            action: action.as_str().to_string(),
            success,
            metadata,
            created_utc: Utc::now(),
        }
    }
}
