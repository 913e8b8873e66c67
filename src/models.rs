use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::roles::Role;

// --- Database rows ---

/// UserRecord
///
/// Full row from the `users` table, including the bcrypt password hash.
/// Never serialized to clients — responses go through [`UserView`].
#[derive(Debug, Clone, FromRow, Default)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub country: String,
    pub agreed_to_terms: bool,
    /// Stored role tag ('0'..'3').
    pub role: String,
    /// bcrypt hash.
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Typed view of the stored role tag. Unknown tags (which the write paths
    /// never produce) degrade to the unprivileged role rather than escalate.
    pub fn role(&self) -> Role {
        Role::from_tag(&self.role).unwrap_or(Role::User)
    }
}

/// UserView
///
/// Client-facing projection of a user: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub user_id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub country: String,
    pub agreed_to_terms: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserView {
    fn from(record: UserRecord) -> Self {
        let role = record.role();
        Self {
            user_id: record.user_id,
            username: record.username,
            firstname: record.firstname,
            lastname: record.lastname,
            email: record.email,
            gender: record.gender,
            country: record.country,
            agreed_to_terms: record.agreed_to_terms,
            role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Question row. The `user_id` is the immutable owner, set at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_link: Option<String>,
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Question joined with its author's public identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithAuthor {
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_link: Option<String>,
    pub tag: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answer row. Owned by `user_id`, attached to `question_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer_id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answer joined with its author's public identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnswerWithAuthor {
    pub answer_id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
    pub url: Option<String>,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request payloads ---

/// Registration payload. Validation collects every failed rule instead of
/// stopping at the first one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub agreed_to_terms: Option<bool>,
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let username = trimmed(&self.username);
        let firstname = trimmed(&self.firstname);
        let lastname = trimmed(&self.lastname);
        let email = trimmed(&self.email);
        let gender = trimmed(&self.gender);
        let country = trimmed(&self.country);
        let password = trimmed(&self.password);

        if username.is_empty()
            || firstname.is_empty()
            || lastname.is_empty()
            || email.is_empty()
            || gender.is_empty()
            || country.is_empty()
            || password.is_empty()
        {
            errors.push("All fields are required.".to_string());
        }

        if username.len() < 3 {
            errors.push("Username must be at least 3 characters long.".to_string());
        }
        if !is_letters_only(firstname) {
            errors.push("First name must contain letters only.".to_string());
        }
        if !is_letters_only(lastname) {
            errors.push("Last name must contain letters only.".to_string());
        }
        if !is_valid_email(email) {
            errors.push("Invalid email format.".to_string());
        }
        if self.agreed_to_terms != Some(true) {
            errors.push("You must agree to the terms.".to_string());
        }
        check_password_complexity(password, &mut errors);

        errors
    }
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if trimmed(&self.email).is_empty() {
            errors.push("Email is required.".to_string());
        }
        if trimmed(&self.password).is_empty() {
            errors.push("Password is required.".to_string());
        }
        errors
    }
}

/// Partial profile update. Staff-gated; may also reassign the role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ProfileUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let any_field = [&self.username, &self.firstname, &self.lastname, &self.role]
            .iter()
            .any(|field| field.as_deref().map(str::trim).is_some_and(|s| !s.is_empty()));
        if !any_field {
            errors.push("At least one field must be provided for update.".to_string());
        }

        if let Some(username) = self.username.as_deref().map(str::trim) {
            if !username.is_empty() && username.len() < 3 {
                errors.push("Username must be at least 3 characters long.".to_string());
            }
        }
        if let Some(firstname) = self.firstname.as_deref().map(str::trim) {
            if !firstname.is_empty() && !is_letters_only(firstname) {
                errors.push("First name must contain letters only.".to_string());
            }
        }
        if let Some(lastname) = self.lastname.as_deref().map(str::trim) {
            if !lastname.is_empty() && !is_letters_only(lastname) {
                errors.push("Last name must contain letters only.".to_string());
            }
        }
        if let Some(role) = self.role.as_deref().map(str::trim) {
            if !role.is_empty() && parse_assignable_role(role).is_none() {
                errors.push("Invalid role provided.".to_string());
            }
        }

        errors
    }
}

/// Role reassignment payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RoleUpdateRequest {
    pub role: Option<String>,
}

impl RoleUpdateRequest {
    /// Returns the parsed role, or the collected validation errors.
    pub fn validate(&self) -> Result<Role, Vec<String>> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Err(vec!["Role is required.".to_string()]),
            Some(tag) => {
                parse_assignable_role(tag).ok_or_else(|| vec!["Invalid role provided.".to_string()])
            }
        }
    }
}

/// Password-reset request (step one: email the link).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

/// Password update (step two: set the new password).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateRequest {
    pub new_password: Option<String>,
}

impl PasswordUpdateRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self.new_password.as_deref() {
            None | Some("") => errors.push("New password is required.".to_string()),
            Some(password) => check_password_complexity(password, &mut errors),
        }
        errors
    }
}

/// New question payload. The image, if any, is uploaded first through the
/// image endpoint and referenced here by its link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
}

impl CreateQuestionRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if trimmed(&self.title).is_empty() {
            errors.push("Title is required.".to_string());
        }
        if trimmed(&self.description).is_empty() {
            errors.push("Description is required.".to_string());
        }
        if trimmed(&self.tag).is_empty() {
            errors.push("At least one tag is required.".to_string());
        }
        errors
    }
}

/// Partial question update. All fields optional; ownership is enforced by
/// the repository's conditional update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_link: Option<String>,
}

/// New answer payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateAnswerRequest {
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CreateAnswerRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if trimmed(&self.answer).is_empty() {
            errors.push("Answer cannot be empty.".to_string());
        }
        if let Some(url) = self.url.as_deref() {
            if !url.is_empty() && !is_valid_answer_url(url) {
                errors.push(INVALID_URL_MSG.to_string());
            }
        }
        errors
    }
}

/// Partial answer update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateAnswerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl UpdateAnswerRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let answer = self.answer.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if answer.is_none() && url.is_none() {
            errors.push("At least one field should be passed for updating.".to_string());
        }
        if let Some(url) = url {
            if !is_valid_answer_url(url) {
                errors.push(INVALID_URL_MSG.to_string());
            }
        }

        errors
    }
}

// --- Response envelopes carrying data ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub question: QuestionWithAuthor,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionsResponse {
    pub questions: Vec<QuestionWithAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    /// Link to pass back in question payloads and the image endpoint.
    pub image_link: String,
}

// --- Validation helpers ---

const INVALID_URL_MSG: &str = "Invalid URL format. URL must start with 'https://www.'";

const PASSWORD_RULE_MSG: &str = "Password must be at least 6 characters long and include one \
     uppercase letter, one lowercase letter, one number, and one special character.";

/// Characters accepted as the "special character" in passwords. Any other
/// non-alphanumeric character fails the complexity rule.
const PASSWORD_SPECIALS: &[char] = &['@', '$', '!', '%', '*', '?', '&', '#'];

fn trimmed(field: &Option<String>) -> &str {
    field.as_deref().map(str::trim).unwrap_or("")
}

fn is_letters_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Minimal shape check mirroring `local@domain.tld`: one '@', a non-empty
/// local part, a dotted domain, no whitespace.
fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.split('.').count() >= 2
                && domain.split('.').all(|seg| !seg.is_empty())
        }
        _ => false,
    }
}

fn is_valid_answer_url(url: &str) -> bool {
    url.starts_with("https://www.")
}

/// At least 6 characters drawn from letters, digits and the accepted special
/// set, with at least one of each class present.
fn check_password_complexity(password: &str, errors: &mut Vec<String>) {
    let long_enough = password.len() >= 6;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(&c));
    let only_allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(&c));

    if !(long_enough && has_lower && has_upper && has_digit && has_special && only_allowed) {
        errors.push(PASSWORD_RULE_MSG.to_string());
    }
}

/// Parses a role tag that users are allowed to assign. `"3"` parses as a
/// role but is not assignable, so it is rejected here.
pub fn parse_assignable_role(tag: &str) -> Option<Role> {
    Role::from_tag(tag).filter(|role| crate::roles::ASSIGNABLE_ROLES.contains(role))
}
