//! Revocation ledger model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A revoked token identifier.
///
/// Presence of a row means the jti is invalid regardless of signature
/// validity or expiry. The ledger is keyed by jti with a unique constraint;
/// the refresh-rotation protocol relies on the insert telling first use from
/// replay.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub jti: Uuid,
    pub user_id: Uuid,
    pub revoked_utc: DateTime<Utc>,
}

impl RevokedToken {
    pub fn new(jti: Uuid, user_id: Uuid, revoked_utc: DateTime<Utc>) -> Self {
        Self {
            jti,
            user_id,
            revoked_utc,
        }
    }
}
