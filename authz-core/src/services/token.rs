//! Token service - issues, verifies, and revokes signed session tokens.
//!
//! Access and refresh tokens share one claim shape plus a `kind`
//! discriminant so a refresh token can never pass where an access token is
//! expected. Expiry is evaluated against the injected clock, not stored
//! state; revocation is a shared-store ledger keyed by jti. Every
//! verification failure is the uniform `Unauthorized` externally while the
//! audit record keeps the distinction.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::error::AuthzError;
use crate::models::{AuditAction, AuditRecord, RevokedToken};
use crate::services::audit::{record_best_effort, AuditSink};
use crate::services::clock::Clock;
use crate::store::Store;
use crate::utils::parse_ttl;

/// Discriminates the two token flavors inside one claim shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Signed token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Unique token identifier, the revocation key.
    pub jti: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Access or refresh.
    pub kind: TokenKind,
}

impl TokenClaims {
    pub fn subject(&self) -> Result<Uuid, AuthzError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthzError::Unauthorized)
    }

    pub fn token_id(&self) -> Result<Uuid, AuthzError> {
        Uuid::parse_str(&self.jti).map_err(|_| AuthzError::Unauthorized)
    }
}

/// Token pair returned to the boundary layer on issue and rotation.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Internal verification failure, retained for the audit trail only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    Malformed,
    Expired,
    WrongKind,
    Revoked,
    Replayed,
    UnknownActor,
}

impl RejectReason {
    fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::Expired => "expired",
            RejectReason::WrongKind => "wrong_kind",
            RejectReason::Revoked => "revoked",
            RejectReason::Replayed => "replayed",
            RejectReason::UnknownActor => "unknown_actor",
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Build a token service from config. TTL strings are parsed here so a
    /// bad configuration fails at startup, not at the first sign.
    pub fn new(
        config: &TokenConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, AuthzError> {
        if config.secret.is_empty() {
            return Err(AuthzError::ConfigError(
                "token secret must not be empty".to_string(),
            ));
        }
        let access_ttl = parse_ttl(&config.access_ttl)?;
        let refresh_ttl = parse_ttl(&config.refresh_ttl)?;

        tracing::info!(
            access_ttl = %config.access_ttl,
            refresh_ttl = %config.refresh_ttl,
            "Token service initialized with HS256 signing"
        );

        Ok(Self {
            store,
            clock,
            audit,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Access-token lifetime in seconds, for boundary responses.
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a short-lived access token for an existing actor.
    pub async fn sign_access(&self, user_id: Uuid) -> Result<String, AuthzError> {
        self.sign(user_id, TokenKind::Access).await
    }

    /// Sign a long-lived refresh token for an existing actor.
    pub async fn sign_refresh(&self, user_id: Uuid) -> Result<String, AuthzError> {
        self.sign(user_id, TokenKind::Refresh).await
    }

    /// Sign a fresh access/refresh pair.
    pub async fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthzError> {
        let access_token = self.sign_access(user_id).await?;
        let refresh_token = self.sign_refresh(user_id).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_seconds(),
        })
    }

    /// Validate signature, expiry, kind, and the revocation ledger.
    ///
    /// Any failure is `Unauthorized`; only a store outage surfaces
    /// differently, as `StoreUnavailable`.
    pub async fn verify(
        &self,
        token: &str,
        expected_kind: TokenKind,
    ) -> Result<TokenClaims, AuthzError> {
        self.verify_inner(token, expected_kind, true).await
    }

    /// Validate signature, expiry, and kind, skipping the revocation ledger.
    ///
    /// Exists for the rotation flow, which must read the jti before deciding
    /// to revoke it; checking revocation here and immediately revoking would
    /// be redundant and racy.
    pub async fn verify_without_revocation_check(
        &self,
        token: &str,
        expected_kind: TokenKind,
    ) -> Result<TokenClaims, AuthzError> {
        self.verify_inner(token, expected_kind, false).await
    }

    /// Revoke a token by writing its jti to the ledger. Idempotent:
    /// revoking an already-revoked token succeeds silently. Expiry is not
    /// consulted; an expired-but-valid token can still be listed.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthzError> {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(reason) => {
                self.audit_rejection(None, reason).await;
                return Err(AuthzError::Unauthorized);
            }
        };
        let user_id = claims.subject()?;
        let jti = claims.token_id()?;

        self.store
            .insert_revoked_token(&RevokedToken::new(jti, user_id, self.clock.now()))
            .await?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(user_id),
                None,
                AuditAction::TokenRevoked,
                true,
                serde_json::json!({ "jti": jti, "kind": claims.kind.as_str() }),
            ),
        )
        .await;

        Ok(())
    }

    /// One-time-use refresh rotation: parse the presented refresh token
    /// without a revocation check, immediately mark its jti revoked, and
    /// issue a fresh pair. Two concurrent rotations of the same token race
    /// on the ledger upsert; exactly one wins a new pair.
    pub async fn rotate_refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthzError> {
        let claims = self
            .verify_without_revocation_check(refresh_token, TokenKind::Refresh)
            .await?;
        let user_id = claims.subject()?;
        let jti = claims.token_id()?;

        let first_use = self
            .store
            .insert_revoked_token(&RevokedToken::new(jti, user_id, self.clock.now()))
            .await?;
        if !first_use {
            self.audit_rejection(Some(user_id), RejectReason::Replayed)
                .await;
            return Err(AuthzError::Unauthorized);
        }

        let pair = match self.issue_pair(user_id).await {
            Ok(pair) => pair,
            Err(AuthzError::NotFound(_)) => {
                // Actor disappeared between issue and rotation.
                self.audit_rejection(Some(user_id), RejectReason::UnknownActor)
                    .await;
                return Err(AuthzError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(user_id),
                None,
                AuditAction::TokenRefreshed,
                true,
                serde_json::json!({ "rotated_jti": jti }),
            ),
        )
        .await;

        Ok(pair)
    }

    async fn sign(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthzError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AuthzError::not_found("user"))?;

        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = self.clock.now();
        let jti = Uuid::new_v4();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            jti: jti.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthzError::ConfigError(format!("token encoding failed: {}", e)))?;

        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(user_id),
                None,
                AuditAction::TokenIssued,
                true,
                serde_json::json!({ "jti": jti, "kind": kind.as_str() }),
            ),
        )
        .await;

        Ok(token)
    }

    async fn verify_inner(
        &self,
        token: &str,
        expected_kind: TokenKind,
        check_revocation: bool,
    ) -> Result<TokenClaims, AuthzError> {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(reason) => {
                self.audit_rejection(None, reason).await;
                return Err(AuthzError::Unauthorized);
            }
        };
        let actor = claims.subject().ok();

        if claims.exp <= self.clock.now().timestamp() {
            self.audit_rejection(actor, RejectReason::Expired).await;
            return Err(AuthzError::Unauthorized);
        }
        if claims.kind != expected_kind {
            self.audit_rejection(actor, RejectReason::WrongKind).await;
            return Err(AuthzError::Unauthorized);
        }

        if check_revocation {
            // Store failures propagate as StoreUnavailable, never folded
            // into Unauthorized.
            let jti = claims.token_id()?;
            if self.store.is_token_revoked(jti).await? {
                self.audit_rejection(actor, RejectReason::Revoked).await;
                return Err(AuthzError::Unauthorized);
            }
        }

        Ok(claims)
    }

    /// Signature and shape validation only; expiry is checked against the
    /// injected clock by the caller.
    fn decode_claims(&self, token: &str) -> Result<TokenClaims, RejectReason> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| RejectReason::Malformed)
    }

    async fn audit_rejection(&self, actor_id: Option<Uuid>, reason: RejectReason) {
        tracing::debug!(reason = reason.as_str(), "token rejected");
        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                actor_id,
                None,
                AuditAction::TokenRejected,
                false,
                serde_json::json!({ "reason": reason.as_str() }),
            ),
        )
        .await;
    }
}
