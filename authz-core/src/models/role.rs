//! Role model - named permission bundles tied to a context type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::scope::GLOBAL_CONTEXT_TYPE;

/// A role is valid for exactly one context type (or the `"global"` sentinel)
/// and can only be assigned within contexts of that type. Names are unique
/// per context type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    pub context_type: String,
    pub created_utc: DateTime<Utc>,
}

impl Role {
    pub fn new(name: String, context_type: String) -> Self {
        Self {
            role_id: Uuid::new_v4(),
            name,
            context_type,
            created_utc: Utc::now(),
        }
    }

    /// Whether this role uses the global sentinel type and may be assigned
    /// without a concrete context.
    pub fn is_global(&self) -> bool {
        self.context_type == GLOBAL_CONTEXT_TYPE
    }
}
