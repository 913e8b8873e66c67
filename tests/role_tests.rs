use qa_platform::{
    Role, STAFF_ROLES, SUPER_ADMIN_ROLES,
    auth::AuthUser,
    roles::{ASSIGNABLE_ROLES, authorize, ensure_role},
};
use uuid::Uuid;

fn identity(role: Role) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        username: "someone".to_string(),
        role,
    }
}

#[test]
fn staff_gate_is_set_membership() {
    assert!(!authorize(STAFF_ROLES, Role::User));
    assert!(authorize(STAFF_ROLES, Role::Admin));
    assert!(authorize(STAFF_ROLES, Role::SubAdmin));
    assert!(authorize(STAFF_ROLES, Role::SuperAdmin));
}

#[test]
fn super_admin_gate_admits_only_super_admin() {
    assert!(!authorize(SUPER_ADMIN_ROLES, Role::User));
    assert!(!authorize(SUPER_ADMIN_ROLES, Role::Admin));
    assert!(!authorize(SUPER_ADMIN_ROLES, Role::SubAdmin));
    assert!(authorize(SUPER_ADMIN_ROLES, Role::SuperAdmin));
}

#[test]
fn empty_allow_list_admits_nobody() {
    for role in [Role::User, Role::Admin, Role::SubAdmin, Role::SuperAdmin] {
        assert!(!authorize(&[], role));
    }
}

#[test]
fn super_admin_is_never_assignable() {
    assert!(!ASSIGNABLE_ROLES.contains(&Role::SuperAdmin));
}

#[test]
fn ensure_role_rejects_with_forbidden() {
    assert!(ensure_role(&identity(Role::Admin), STAFF_ROLES).is_ok());

    let err = ensure_role(&identity(Role::User), STAFF_ROLES).unwrap_err();
    let response = axum::response::IntoResponse::into_response(err);
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}

#[test]
fn role_tags_round_trip() {
    for (role, tag) in [
        (Role::User, "0"),
        (Role::Admin, "1"),
        (Role::SubAdmin, "2"),
        (Role::SuperAdmin, "3"),
    ] {
        assert_eq!(role.as_tag(), tag);
        assert_eq!(Role::from_tag(tag), Some(role));
    }
    assert_eq!(Role::from_tag("4"), None);
    assert_eq!(Role::from_tag("admin"), None);
}
