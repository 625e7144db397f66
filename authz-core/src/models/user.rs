//! Principal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A principal the core makes decisions about.
///
/// The credential hash is opaque here: hashing and verification belong to an
/// external authenticator. A user is never hard-deleted while grants,
/// assignments or audit rows reference it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub credential_hash: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn new(credential_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            credential_hash,
            created_utc: Utc::now(),
        }
    }
}
