//! PostgreSQL store.
//!
//! Runtime-bound sqlx queries over the schema in `migrations/`. Scope tiers
//! are flattened into two nullable columns; idempotent inserts use
//! `ON CONFLICT DO NOTHING`, and the role deletion cascade runs in one
//! transaction.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::AuthzError;
use crate::models::{
    AuditRecord, Context, Permission, RevokedToken, Role, RoleBinding, Scope, User,
    UserPermissionGrant, UserRoleAssignment,
};
use crate::store::Store;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AuthzError> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.url)
        .await?;

    tracing::info!("Successfully connected to PostgreSQL");

    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AuthzError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// PostgreSQL-backed `Store`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AuthzError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct BindingRow {
    role_id: Uuid,
    permission_key: String,
    scope_context_type: Option<String>,
    scope_context_id: Option<Uuid>,
}

impl From<BindingRow> for RoleBinding {
    fn from(row: BindingRow) -> Self {
        RoleBinding {
            role_id: row.role_id,
            permission_key: row.permission_key,
            scope: Scope::from_columns(row.scope_context_type, row.scope_context_id),
        }
    }
}

#[derive(FromRow)]
struct GrantRow {
    user_id: Uuid,
    permission_key: String,
    scope_context_type: Option<String>,
    scope_context_id: Option<Uuid>,
}

impl From<GrantRow> for UserPermissionGrant {
    fn from(row: GrantRow) -> Self {
        UserPermissionGrant {
            user_id: row.user_id,
            permission_key: row.permission_key,
            scope: Scope::from_columns(row.scope_context_type, row.scope_context_id),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), AuthzError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, credential_hash, created_utc)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.credential_hash)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AuthzError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_credential(
        &self,
        user_id: Uuid,
        credential_hash: &str,
    ) -> Result<bool, AuthzError> {
        let result = sqlx::query("UPDATE users SET credential_hash = $1 WHERE user_id = $2")
            .bind(credential_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AuthzError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_has_references(&self, user_id: Uuid) -> Result<bool, AuthzError> {
        let (referenced,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM user_role_assignments WHERE user_id = $1)
                OR EXISTS (SELECT 1 FROM user_permission_grants WHERE user_id = $1)
                OR EXISTS (SELECT 1 FROM audit_records WHERE actor_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(referenced)
    }

    async fn insert_context(&self, context: &Context) -> Result<(), AuthzError> {
        sqlx::query(
            r#"
            INSERT INTO contexts (context_id, context_type, parent_context_id, created_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(context.context_id)
        .bind(&context.context_type)
        .bind(context.parent_context_id)
        .bind(context.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_context_by_id(&self, context_id: Uuid) -> Result<Option<Context>, AuthzError> {
        let context = sqlx::query_as::<_, Context>("SELECT * FROM contexts WHERE context_id = $1")
            .bind(context_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(context)
    }

    async fn find_child_contexts(&self, parent_id: Uuid) -> Result<Vec<Context>, AuthzError> {
        let contexts =
            sqlx::query_as::<_, Context>("SELECT * FROM contexts WHERE parent_context_id = $1")
                .bind(parent_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(contexts)
    }

    async fn update_context_parent(
        &self,
        context_id: Uuid,
        parent_context_id: Option<Uuid>,
    ) -> Result<bool, AuthzError> {
        let result =
            sqlx::query("UPDATE contexts SET parent_context_id = $1 WHERE context_id = $2")
                .bind(parent_context_id)
                .bind(context_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_permission(&self, permission: &Permission) -> Result<bool, AuthzError> {
        let result = sqlx::query(
            r#"
            INSERT INTO permissions (permission_key, label, created_utc)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&permission.permission_key)
        .bind(&permission.label)
        .bind(permission.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_permission(
        &self,
        permission_key: &str,
    ) -> Result<Option<Permission>, AuthzError> {
        let permission =
            sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE permission_key = $1")
                .bind(permission_key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(permission)
    }

    async fn insert_role(&self, role: &Role) -> Result<bool, AuthzError> {
        let result = sqlx::query(
            r#"
            INSERT INTO roles (role_id, name, context_type, created_utc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role.role_id)
        .bind(&role.name)
        .bind(&role.context_type)
        .bind(role.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_role_by_id(&self, role_id: Uuid) -> Result<Option<Role>, AuthzError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_role_by_name(
        &self,
        name: &str,
        context_type: &str,
    ) -> Result<Option<Role>, AuthzError> {
        let role =
            sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1 AND context_type = $2")
                .bind(name)
                .bind(context_type)
                .fetch_optional(&self.pool)
                .await?;
        Ok(role)
    }

    async fn delete_role_cascade(&self, role_id: Uuid) -> Result<(), AuthzError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_bindings WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_role_assignments WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_role_binding(&self, binding: &RoleBinding) -> Result<(), AuthzError> {
        let (scope_type, scope_id) = binding.scope.columns();
        sqlx::query(
            r#"
            INSERT INTO role_bindings (role_id, permission_key, scope_context_type, scope_context_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(binding.role_id)
        .bind(&binding.permission_key)
        .bind(scope_type)
        .bind(scope_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_role_binding(
        &self,
        role_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError> {
        let (scope_type, scope_id) = scope.columns();
        let result = sqlx::query(
            r#"
            DELETE FROM role_bindings
            WHERE role_id = $1
              AND permission_key = $2
              AND scope_context_type IS NOT DISTINCT FROM $3
              AND scope_context_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(role_id)
        .bind(permission_key)
        .bind(scope_type)
        .bind(scope_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_role_bindings(
        &self,
        role_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<RoleBinding>, AuthzError> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT * FROM role_bindings WHERE role_id = $1 AND permission_key = $2",
        )
        .bind(role_id)
        .bind(permission_key)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RoleBinding::from).collect())
    }

    async fn upsert_assignment(&self, assignment: &UserRoleAssignment) -> Result<(), AuthzError> {
        sqlx::query(
            r#"
            INSERT INTO user_role_assignments (user_id, role_id, context_id, context_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(assignment.user_id)
        .bind(assignment.role_id)
        .bind(assignment.context_id)
        .bind(&assignment.context_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_assignments_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserRoleAssignment>, AuthzError> {
        let assignments = sqlx::query_as::<_, UserRoleAssignment>(
            "SELECT * FROM user_role_assignments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    async fn upsert_grant(&self, grant: &UserPermissionGrant) -> Result<(), AuthzError> {
        let (scope_type, scope_id) = grant.scope.columns();
        sqlx::query(
            r#"
            INSERT INTO user_permission_grants (user_id, permission_key, scope_context_type, scope_context_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(grant.user_id)
        .bind(&grant.permission_key)
        .bind(scope_type)
        .bind(scope_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_grant(
        &self,
        user_id: Uuid,
        permission_key: &str,
        scope: &Scope,
    ) -> Result<bool, AuthzError> {
        let (scope_type, scope_id) = scope.columns();
        let result = sqlx::query(
            r#"
            DELETE FROM user_permission_grants
            WHERE user_id = $1
              AND permission_key = $2
              AND scope_context_type IS NOT DISTINCT FROM $3
              AND scope_context_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(user_id)
        .bind(permission_key)
        .bind(scope_type)
        .bind(scope_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_grants_for_user(
        &self,
        user_id: Uuid,
        permission_key: &str,
    ) -> Result<Vec<UserPermissionGrant>, AuthzError> {
        let rows = sqlx::query_as::<_, GrantRow>(
            "SELECT * FROM user_permission_grants WHERE user_id = $1 AND permission_key = $2",
        )
        .bind(user_id)
        .bind(permission_key)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserPermissionGrant::from).collect())
    }

    async fn insert_revoked_token(&self, token: &RevokedToken) -> Result<bool, AuthzError> {
        let result = sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, revoked_utc)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(token.jti)
        .bind(token.user_id)
        .bind(token.revoked_utc)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, AuthzError> {
        let (revoked,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;
        Ok(revoked)
    }

    async fn append_audit(&self, record: &AuditRecord) -> Result<(), AuthzError> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (record_id, actor_id, context_id, action, success, metadata, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.record_id)
        .bind(record.actor_id)
        .bind(record.context_id)
        .bind(&record.action)
        .bind(record.success)
        .bind(&record.metadata)
        .bind(record.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
