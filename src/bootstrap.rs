use crate::{
    password::hash_password,
    repository::{NewUser, RepoError, Repository},
    roles::Role,
};

pub const SUPER_ADMIN_EMAIL: &str = "superAdmin@admin.com";

/// Find-or-create for the built-in superAdmin account, run once at startup
/// after migrations. Idempotent: an existing account (including one created
/// concurrently by another instance) leaves the call a no-op.
pub async fn ensure_super_admin(
    repo: &dyn Repository,
    password: &str,
) -> Result<(), crate::errors::ApiError> {
    if repo.find_user_by_email(SUPER_ADMIN_EMAIL).await?.is_some() {
        tracing::debug!("superAdmin account already present");
        return Ok(());
    }

    let password_hash = hash_password(password).await?;
    let user = NewUser {
        username: "superAdmin".to_string(),
        firstname: "superAdmin".to_string(),
        lastname: "superAdmin".to_string(),
        email: SUPER_ADMIN_EMAIL.to_string(),
        gender: "male".to_string(),
        country: "Ethiopia".to_string(),
        agreed_to_terms: true,
        role: Role::SuperAdmin,
        password_hash,
    };

    match repo.create_user(user).await {
        Ok(record) => {
            tracing::info!(user_id = %record.user_id, "superAdmin account created");
            Ok(())
        }
        // Lost the race against another instance bootstrapping the same row.
        Err(RepoError::DuplicateEmail) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
