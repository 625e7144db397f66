//! Scope algebra shared by role bindings and direct grants.
//!
//! A grant lives at exactly one of three tiers: global, type-wide, or bound
//! to one concrete context. A check request carries the shape it wants to
//! act in, and `Scope::matches` decides tier by tier. Scopes are not
//! hierarchical through the context parent chain: a grant at a parent never
//! propagates to children.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context type sentinel for roles that are assignable globally.
pub const GLOBAL_CONTEXT_TYPE: &str = "global";

/// Where a grant or role binding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Scope {
    /// Applies everywhere.
    Global,
    /// Applies to every context of one type.
    ContextType { context_type: String },
    /// Applies to one concrete context only.
    Context { context_id: Uuid },
}

impl Scope {
    pub fn context_type(context_type: impl Into<String>) -> Self {
        Scope::ContextType {
            context_type: context_type.into(),
        }
    }

    pub fn context(context_id: Uuid) -> Self {
        Scope::Context { context_id }
    }

    /// Whether a grant at this scope satisfies the given request.
    ///
    /// Global always matches; type-wide matches when the request names the
    /// same context type; exact matches only the bound context id.
    pub fn matches(&self, request: &ScopeRequest) -> bool {
        match self {
            Scope::Global => true,
            Scope::ContextType { context_type } => {
                request.context_type() == Some(context_type.as_str())
            }
            Scope::Context { context_id } => request.context_id() == Some(*context_id),
        }
    }

    /// Split into the nullable (type, id) column pair used by the store.
    pub fn columns(&self) -> (Option<&str>, Option<Uuid>) {
        match self {
            Scope::Global => (None, None),
            Scope::ContextType { context_type } => (Some(context_type.as_str()), None),
            Scope::Context { context_id } => (None, Some(*context_id)),
        }
    }

    /// Rebuild from the nullable column pair. An exact id wins over a type.
    pub fn from_columns(context_type: Option<String>, context_id: Option<Uuid>) -> Self {
        match (context_id, context_type) {
            (Some(context_id), _) => Scope::Context { context_id },
            (None, Some(context_type)) => Scope::ContextType { context_type },
            (None, None) => Scope::Global,
        }
    }
}

/// The shape of scope a permission check asks about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeRequest {
    /// Global-only check, no context involved.
    Global,
    /// "Can this actor act on any context of this type", with no concrete id.
    ContextType { context_type: String },
    /// A concrete context the caller wants to act in. The declared type is
    /// validated against the stored context before resolution.
    Context {
        context_id: Uuid,
        context_type: String,
    },
}

impl ScopeRequest {
    pub fn context_type_of(context_type: impl Into<String>) -> Self {
        ScopeRequest::ContextType {
            context_type: context_type.into(),
        }
    }

    pub fn context(context_id: Uuid, context_type: impl Into<String>) -> Self {
        ScopeRequest::Context {
            context_id,
            context_type: context_type.into(),
        }
    }

    pub fn context_type(&self) -> Option<&str> {
        match self {
            ScopeRequest::Global => None,
            ScopeRequest::ContextType { context_type }
            | ScopeRequest::Context { context_type, .. } => Some(context_type.as_str()),
        }
    }

    pub fn context_id(&self) -> Option<Uuid> {
        match self {
            ScopeRequest::Context { context_id, .. } => Some(*context_id),
            _ => None,
        }
    }

    /// Compact rendering for audit metadata and deny diagnostics.
    pub fn describe(&self) -> String {
        match self {
            ScopeRequest::Global => "global".to_string(),
            ScopeRequest::ContextType { context_type } => format!("type:{}", context_type),
            ScopeRequest::Context {
                context_id,
                context_type,
            } => format!("context:{}:{}", context_type, context_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_matches_every_request() {
        let requests = [
            ScopeRequest::Global,
            ScopeRequest::context_type_of("team"),
            ScopeRequest::context(Uuid::new_v4(), "team"),
        ];
        for request in &requests {
            assert!(Scope::Global.matches(request), "failed for {:?}", request);
        }
    }

    #[test]
    fn type_scope_matches_same_type_only() {
        let scope = Scope::context_type("team");
        assert!(scope.matches(&ScopeRequest::context_type_of("team")));
        assert!(scope.matches(&ScopeRequest::context(Uuid::new_v4(), "team")));
        assert!(!scope.matches(&ScopeRequest::context_type_of("org")));
        assert!(!scope.matches(&ScopeRequest::context(Uuid::new_v4(), "org")));
        assert!(!scope.matches(&ScopeRequest::Global));
    }

    #[test]
    fn exact_scope_matches_bound_context_only() {
        let bound = Uuid::new_v4();
        let scope = Scope::context(bound);
        assert!(scope.matches(&ScopeRequest::context(bound, "team")));
        assert!(!scope.matches(&ScopeRequest::context(Uuid::new_v4(), "team")));
        assert!(!scope.matches(&ScopeRequest::context_type_of("team")));
        assert!(!scope.matches(&ScopeRequest::Global));
    }

    #[test]
    fn column_round_trip_preserves_tier() {
        let scopes = [
            Scope::Global,
            Scope::context_type("org"),
            Scope::context(Uuid::new_v4()),
        ];
        for scope in scopes {
            let (context_type, context_id) = scope.columns();
            let rebuilt = Scope::from_columns(context_type.map(str::to_string), context_id);
            assert_eq!(rebuilt, scope);
        }
    }
}
