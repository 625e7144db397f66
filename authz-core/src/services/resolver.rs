//! Permission resolver - the decision engine.
//!
//! A check is an OR across four independent grant sources: global direct
//! grant, type-wide direct grant, exact-context direct grant, and
//! role-derived grants. There is no explicit deny; absence of a match is the
//! only deny condition. Missing actors and missing contexts resolve to deny,
//! never to an error. A declared context type that disagrees with the stored
//! context fails closed before any grant is consulted.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthzError;
use crate::models::{AuditAction, AuditRecord, ScopeRequest, UserRoleAssignment};
use crate::services::audit::{record_best_effort, AuditSink};
use crate::store::Store;

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditSink>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Decide whether `actor_id` may exercise `permission_key` in the
    /// requested scope. Errors only on malformed input or store failure;
    /// every ambiguous situation is a deny.
    pub async fn check(
        &self,
        actor_id: Uuid,
        permission_key: &str,
        request: &ScopeRequest,
    ) -> Result<Decision, AuthzError> {
        if permission_key.trim().is_empty() {
            return Err(AuthzError::invalid_input("permission key must not be empty"));
        }
        if let Some(context_type) = request.context_type() {
            if context_type.trim().is_empty() {
                return Err(AuthzError::invalid_input("context type must not be empty"));
            }
        }

        // Fail closed on a spoofed context type before consulting any grant.
        if let ScopeRequest::Context {
            context_id,
            context_type,
        } = request
        {
            match self.store.find_context_by_id(*context_id).await? {
                None => {
                    tracing::debug!(%actor_id, %context_id, "deny: unknown context");
                    return Ok(Decision::Deny);
                }
                Some(context) if context.context_type != *context_type => {
                    tracing::warn!(
                        %actor_id,
                        %context_id,
                        declared = %context_type,
                        stored = %context.context_type,
                        "deny: declared context type does not match stored type"
                    );
                    return Ok(Decision::Deny);
                }
                Some(_) => {}
            }
        }

        // Sources 1-3: direct grants at any matching tier.
        let grants = self
            .store
            .find_grants_for_user(actor_id, permission_key)
            .await?;
        if grants.iter().any(|g| g.scope.matches(request)) {
            return Ok(Decision::Allow);
        }

        // Source 4: role-derived grants.
        let assignments = self.store.find_assignments_for_user(actor_id).await?;
        for assignment in assignments
            .iter()
            .filter(|a| assignment_matches(a, request))
        {
            let bindings = self
                .store
                .find_role_bindings(assignment.role_id, permission_key)
                .await?;
            if bindings.iter().any(|b| b.scope.matches(request)) {
                return Ok(Decision::Allow);
            }
        }

        Ok(Decision::Deny)
    }

    /// Same as [`check`](Self::check), additionally emitting a
    /// `permission.check` audit record. Callers choose this variant
    /// explicitly so high-frequency checks do not flood the audit trail.
    pub async fn check_audited(
        &self,
        actor_id: Uuid,
        permission_key: &str,
        request: &ScopeRequest,
    ) -> Result<Decision, AuthzError> {
        let decision = self.check(actor_id, permission_key, request).await?;
        record_best_effort(
            self.audit.as_ref(),
            AuditRecord::new(
                Some(actor_id),
                request.context_id(),
                AuditAction::PermissionCheck,
                decision.is_allow(),
                serde_json::json!({
                    "permission": permission_key,
                    "scope": request.describe(),
                    "decision": decision,
                }),
            ),
        )
        .await;
        Ok(decision)
    }
}

/// Whether an assignment is in play for a request.
///
/// Concrete-context requests take only an exact context match; global
/// requests take only global assignments. Type-wide requests take
/// assignments within any context of that type, plus global assignments.
/// Parent-chain inheritance is deliberately absent.
fn assignment_matches(assignment: &UserRoleAssignment, request: &ScopeRequest) -> bool {
    match request {
        ScopeRequest::Global => assignment.context_id.is_none(),
        ScopeRequest::ContextType { context_type } => {
            assignment.context_id.is_none() || assignment.context_type == *context_type
        }
        ScopeRequest::Context { context_id, .. } => assignment.context_id == Some(*context_id),
    }
}
