//! Bearer-token authentication with permission-based access control.
//!
//! Short-lived access tokens (15 min, stateless) carry the caller's role.
//! Long-lived refresh tokens (7 days) are tracked in the database so they can
//! be revoked. Roles resolve to permission sets through a shared cache.

mod bearer;
mod errors;
mod middleware;
mod permission;
mod resolver;
mod tokens;
mod types;

pub use bearer::bearer_token;
pub use errors::{ApiAuthError, AuthErrorKind};
pub use middleware::{
    PermissionGate, RoleGate, allow_roles, authenticate, require_permission,
};
pub use permission::{is_granted, permission_matches};
pub use resolver::{ResolveError, ResolvedRole, RoleResolver};
pub use tokens::{RefreshSubject, TokenError, TokenService};
pub use types::Identity;
