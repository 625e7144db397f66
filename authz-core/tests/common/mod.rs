//! Shared harness for integration tests.
//!
//! Wires every service over the in-memory store, a manual clock, and a
//! memory audit sink so suites can assert on emitted records.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use authz_core::config::TokenConfig;
use authz_core::models::{
    AuditRecord, Context, Permission, RevokedToken, Role, RoleBinding, Scope, User,
    UserPermissionGrant, UserRoleAssignment,
};
use authz_core::services::{
    Clock, ContextService, MemoryAuditSink, PermissionRegistry, PermissionResolver, RoleService,
    TokenService, UserService,
};
use authz_core::store::{MemoryStore, Store};
use authz_core::AuthzError;

/// Manually advanced clock for deterministic expiry tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub clock: Arc<ManualClock>,
    pub registry: PermissionRegistry,
    pub users: UserService,
    pub contexts: ContextService,
    pub roles: RoleService,
    pub resolver: PermissionResolver,
    pub tokens: TokenService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        let clock = Arc::new(ManualClock::new());

        let store_dyn: Arc<dyn Store> = store.clone();
        let audit_dyn: Arc<dyn authz_core::services::AuditSink> = audit.clone();

        let registry = PermissionRegistry::new(store_dyn.clone());
        let users = UserService::new(store_dyn.clone(), audit_dyn.clone());
        let contexts = ContextService::new(store_dyn.clone(), audit_dyn.clone());
        let roles = RoleService::new(store_dyn.clone(), registry.clone(), audit_dyn.clone());
        let resolver = PermissionResolver::new(store_dyn.clone(), audit_dyn.clone());

        let tokens = TokenService::new(&token_config(), store_dyn, clock.clone(), audit_dyn)
            .expect("token service");

        Self {
            store,
            audit,
            clock,
            registry,
            users,
            contexts,
            roles,
            resolver,
            tokens,
        }
    }

    pub async fn user(&self) -> User {
        self.users.create_user("hash").await.expect("create user")
    }

    pub async fn context(&self, context_type: &str) -> Context {
        self.contexts
            .create_context(context_type, None)
            .await
            .expect("create context")
    }

    pub async fn permission(&self, key: &str) {
        self.registry.declare(key, key).await.expect("declare");
    }

    pub async fn role(&self, name: &str, context_type: &str) -> Role {
        self.roles
            .create_role(name, context_type)
            .await
            .expect("create role")
    }
}

/// Token config shared by the harness and the outage tests, so a second
/// service can verify tokens the harness signed.
pub fn token_config() -> TokenConfig {
    TokenConfig {
        secret: "integration-test-secret".to_string(),
        access_ttl: "15m".to_string(),
        refresh_ttl: "7d".to_string(),
    }
}

/// Assert an error is the uniform `Unauthorized`.
pub fn assert_unauthorized(result: Result<impl std::fmt::Debug, AuthzError>) {
    match result {
        Err(AuthzError::Unauthorized) => {}
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

/// Assert an error is `StoreUnavailable`.
pub fn assert_store_unavailable(result: Result<impl std::fmt::Debug, AuthzError>) {
    match result {
        Err(AuthzError::StoreUnavailable(_)) => {}
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
}

/// Store double where every operation fails, for asserting that an outage
/// surfaces as `StoreUnavailable` rather than a decision or `Unauthorized`.
pub struct FailingStore;

fn store_offline() -> AuthzError {
    AuthzError::StoreUnavailable(anyhow::anyhow!("store offline"))
}

#[async_trait]
impl Store for FailingStore {
    async fn insert_user(&self, _user: &User) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn find_user_by_id(&self, _user_id: Uuid) -> Result<Option<User>, AuthzError> {
        Err(store_offline())
    }

    async fn update_user_credential(
        &self,
        _user_id: Uuid,
        _credential_hash: &str,
    ) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn delete_user(&self, _user_id: Uuid) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn user_has_references(&self, _user_id: Uuid) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn insert_context(&self, _context: &Context) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn find_context_by_id(&self, _context_id: Uuid) -> Result<Option<Context>, AuthzError> {
        Err(store_offline())
    }

    async fn find_child_contexts(&self, _parent_id: Uuid) -> Result<Vec<Context>, AuthzError> {
        Err(store_offline())
    }

    async fn update_context_parent(
        &self,
        _context_id: Uuid,
        _parent_context_id: Option<Uuid>,
    ) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn insert_permission(&self, _permission: &Permission) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn find_permission(
        &self,
        _permission_key: &str,
    ) -> Result<Option<Permission>, AuthzError> {
        Err(store_offline())
    }

    async fn insert_role(&self, _role: &Role) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn find_role_by_id(&self, _role_id: Uuid) -> Result<Option<Role>, AuthzError> {
        Err(store_offline())
    }

    async fn find_role_by_name(
        &self,
        _name: &str,
        _context_type: &str,
    ) -> Result<Option<Role>, AuthzError> {
        Err(store_offline())
    }

    async fn delete_role_cascade(&self, _role_id: Uuid) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn upsert_role_binding(&self, _binding: &RoleBinding) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn delete_role_binding(
        &self,
        _role_id: Uuid,
        _permission_key: &str,
        _scope: &Scope,
    ) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn find_role_bindings(
        &self,
        _role_id: Uuid,
        _permission_key: &str,
    ) -> Result<Vec<RoleBinding>, AuthzError> {
        Err(store_offline())
    }

    async fn upsert_assignment(&self, _assignment: &UserRoleAssignment) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn find_assignments_for_user(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<UserRoleAssignment>, AuthzError> {
        Err(store_offline())
    }

    async fn upsert_grant(&self, _grant: &UserPermissionGrant) -> Result<(), AuthzError> {
        Err(store_offline())
    }

    async fn delete_grant(
        &self,
        _user_id: Uuid,
        _permission_key: &str,
        _scope: &Scope,
    ) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn find_grants_for_user(
        &self,
        _user_id: Uuid,
        _permission_key: &str,
    ) -> Result<Vec<UserPermissionGrant>, AuthzError> {
        Err(store_offline())
    }

    async fn insert_revoked_token(&self, _token: &RevokedToken) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn is_token_revoked(&self, _jti: Uuid) -> Result<bool, AuthzError> {
        Err(store_offline())
    }

    async fn append_audit(&self, _record: &AuditRecord) -> Result<(), AuthzError> {
        Err(store_offline())
    }
}
