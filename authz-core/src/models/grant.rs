//! Grant rows: role bindings, role assignments, and direct user grants.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::scope::Scope;

/// A permission a role carries, at one scope tier. A role may bind the same
/// permission at multiple tiers independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role_id: Uuid,
    pub permission_key: String,
    pub scope: Scope,
}

impl RoleBinding {
    pub fn new(role_id: Uuid, permission_key: String, scope: Scope) -> Self {
        Self {
            role_id,
            permission_key,
            scope,
        }
    }
}

/// Assigns a role to a user within one concrete context, or globally when
/// `context_id` is absent. `context_type` always equals the role's declared
/// type; the role service rejects anything else before this row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRoleAssignment {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub context_id: Option<Uuid>,
    pub context_type: String,
}

impl UserRoleAssignment {
    pub fn new(
        user_id: Uuid,
        role_id: Uuid,
        context_id: Option<Uuid>,
        context_type: String,
    ) -> Self {
        Self {
            user_id,
            role_id,
            context_id,
            context_type,
        }
    }
}

/// A direct grant bypassing roles, same scope tiers as a role binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionGrant {
    pub user_id: Uuid,
    pub permission_key: String,
    pub scope: Scope,
}

impl UserPermissionGrant {
    pub fn new(user_id: Uuid, permission_key: String, scope: Scope) -> Self {
        Self {
            user_id,
            permission_key,
            scope,
        }
    }
}
