use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::AuthUser, errors::ApiError};

/// Role
///
/// The four privilege tiers, carried as opaque single-character tags both in
/// the database and inside identity tokens. Authorization is always an
/// allow-list membership check over these tags — never a numeric "at least"
/// comparison — so the enum deliberately does not implement `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[default]
    #[serde(rename = "0")]
    User,
    #[serde(rename = "1")]
    Admin,
    #[serde(rename = "2")]
    SubAdmin,
    #[serde(rename = "3")]
    SuperAdmin,
}

impl Role {
    /// The wire/storage tag for this role.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Role::User => "0",
            Role::Admin => "1",
            Role::SubAdmin => "2",
            Role::SuperAdmin => "3",
        }
    }

    /// Parses a stored tag. Unknown tags yield `None`; callers decide whether
    /// that is a validation failure or a fall-back to the default role.
    pub fn from_tag(tag: &str) -> Option<Role> {
        match tag {
            "0" => Some(Role::User),
            "1" => Some(Role::Admin),
            "2" => Some(Role::SubAdmin),
            "3" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

// Route-level allow-lists, fixed at registration time. Each gated router is
// paired with exactly one of these constants in `create_router`.

/// Staff operations: user management endpoints.
pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::SubAdmin, Role::SuperAdmin];

/// Super-admin-only operations: database cleanup.
pub const SUPER_ADMIN_ROLES: &[Role] = &[Role::SuperAdmin];

/// Roles that may be assigned through the role-update endpoint. The
/// superAdmin tier is bootstrapped once at startup and never assignable.
pub const ASSIGNABLE_ROLES: &[Role] = &[Role::User, Role::Admin, Role::SubAdmin];

/// authorize
///
/// The Role Authorization Gate: permits iff the identity's role appears in
/// the allow-list. Stateless and deterministic; an empty allow-list denies
/// everyone.
pub fn authorize(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

/// ensure_role
///
/// Gate helper used by the route guards. Must only be called with an
/// already-authenticated identity — the `AuthUser` extractor guarantees that
/// by construction.
pub fn ensure_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if authorize(allowed, user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Access denied. Insufficient permissions.",
        ))
    }
}
