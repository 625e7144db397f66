//! Multi-tenant authorization core.
//!
//! Decides whether an actor may perform an action inside a hierarchy of
//! scoping contexts, and manages the signed access/refresh tokens that
//! identify actors across requests. Transport, schema validation, and
//! password hashing are boundary concerns that sit on top of this crate.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::AuthzConfig;
pub use error::AuthzError;
pub use models::{Scope, ScopeRequest};
pub use services::{
    ContextService, Decision, PermissionRegistry, PermissionResolver, RoleService, TokenKind,
    TokenService, UserService,
};
pub use store::{MemoryStore, PgStore, Store};

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. `log_level` is the fallback when
/// `RUST_LOG` is unset.
pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
