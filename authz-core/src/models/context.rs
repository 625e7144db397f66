//! Context model - hierarchical scoping units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scoping unit (team, org, project...) forming a forest via optional
/// parent links. The type is immutable after creation; cycles in the parent
/// chain are forbidden.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Context {
    pub context_id: Uuid,
    pub context_type: String,
    pub parent_context_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

impl Context {
    pub fn new(context_type: String, parent_context_id: Option<Uuid>) -> Self {
        Self {
            context_id: Uuid::new_v4(),
            context_type,
            parent_context_id,
            created_utc: Utc::now(),
        }
    }

    /// Whether this context is a root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent_context_id.is_none()
    }
}
