//! Data model for the authorization core.

pub mod audit;
pub mod context;
pub mod grant;
pub mod permission;
pub mod role;
pub mod scope;
pub mod token;
pub mod user;

pub use audit::{AuditAction, AuditRecord};
pub use context::Context;
pub use grant::{RoleBinding, UserPermissionGrant, UserRoleAssignment};
pub use permission::Permission;
pub use role::Role;
pub use scope::{Scope, ScopeRequest, GLOBAL_CONTEXT_TYPE};
pub use token::RevokedToken;
pub use user::User;
