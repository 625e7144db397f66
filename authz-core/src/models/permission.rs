//! Permission registry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A declared permission key.
///
/// Keys are namespaced strings (`"roles:create"`). Declaration happens once;
/// grant paths validate against the registry, check paths never do.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub permission_key: String,
    pub label: String,
    pub created_utc: DateTime<Utc>,
}

impl Permission {
    pub fn new(permission_key: String, label: String) -> Self {
        Self {
            permission_key,
            label,
            created_utc: Utc::now(),
        }
    }
}
