//! Core services: resolution, role administration, tokens, and the
//! collaborator traits (clock, audit sink).

pub mod audit;
pub mod clock;
pub mod contexts;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod token;
pub mod users;

pub use audit::{AuditSink, MemoryAuditSink, StoreAuditSink, TracingAuditSink};
pub use clock::{Clock, SystemClock};
pub use contexts::ContextService;
pub use registry::PermissionRegistry;
pub use resolver::{Decision, PermissionResolver};
pub use roles::RoleService;
pub use token::{TokenClaims, TokenKind, TokenPair, TokenService};
pub use users::UserService;
