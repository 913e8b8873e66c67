/// Router Module Index
///
/// Routing is split into security tiers so that access control is applied at
/// the module level via Axum layers rather than remembered per handler. Each
/// tier below maps to one gate in `create_router`.

/// Routes open to anonymous clients: registration, login, the reset flow,
/// image retrieval and the health probe.
pub mod public;

/// Routes behind the bearer-token gate. Any signed-in user, regardless of
/// role; ownership checks happen at the repository level.
pub mod authenticated;

/// Routes behind the staff gate (admin, subAdmin or superAdmin): user
/// administration.
pub mod staff;

/// Routes behind the superAdmin gate: the database cleanup.
pub mod super_admin;
