use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::{Answer, AnswerWithAuthor, Question, QuestionWithAuthor, UserRecord},
    roles::Role,
};

/// Persistence failures, classified just enough for handlers to pick the
/// right status code. Everything else is an opaque database error logged at
/// the point of conversion.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Unique violation on the email column.
    #[error("email already exists")]
    DuplicateEmail,
    /// Foreign-key violation: the referenced parent row is gone.
    #[error("referenced row does not exist")]
    MissingParent,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateEmail => ApiError::Conflict("Email already exists".to_string()),
            RepoError::MissingParent => ApiError::NotFound("Question not found".to_string()),
            RepoError::Database(e) => {
                tracing::error!("database error: {e:?}");
                ApiError::Internal
            }
        }
    }
}

fn classify(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::DuplicateEmail;
        }
        if db.is_foreign_key_violation() {
            return RepoError::MissingParent;
        }
    }
    RepoError::Database(e)
}

// --- Write payloads ---

/// Insert payload for users. The password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub country: String,
    pub agreed_to_terms: bool,
    pub role: Role,
    pub password_hash: String,
}

/// Partial user update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub tag: String,
    pub image_link: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub image_link: Option<String>,
}

/// Result of an owner-scoped question delete: the image link of the removed
/// row so the caller can clean up the stored file.
#[derive(Debug, Clone)]
pub struct DeletedQuestion {
    pub image_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnswerChanges {
    pub answer: Option<String>,
    pub url: Option<String>,
}

/// Repository Trait
///
/// Abstract contract for all persistence operations, shared as
/// `Arc<dyn Repository>` so handlers never see the concrete store and tests
/// can substitute an in-memory implementation.
///
/// Ownership rule: every mutating question/answer method that takes a
/// `user_id` scopes its statement with `AND user_id = $n` in a *single*
/// conditional update/delete. Zero rows matched means "absent or not yours",
/// and the two cases are indistinguishable by design.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, RepoError>;
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, RepoError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;
    /// Returns false when the user does not exist.
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<bool, RepoError>;
    async fn update_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError>;
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepoError>;
    /// Unconditional delete by primary key. The admin-role deletion guard is
    /// applied by the handler *before* calling this.
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, RepoError>;

    // --- Questions ---
    async fn create_question(&self, question: NewQuestion) -> Result<Question, RepoError>;
    /// Owner-scoped fetch, used to pick up the old image link before an
    /// image-replacing update.
    async fn find_owned_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Question>, RepoError>;
    /// Owner-scoped conditional update.
    async fn update_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, RepoError>;
    /// Owner-scoped conditional delete.
    async fn delete_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<DeletedQuestion>, RepoError>;
    async fn get_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<QuestionWithAuthor>, RepoError>;
    async fn questions_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<QuestionWithAuthor>, RepoError>;
    async fn all_questions(&self) -> Result<Vec<QuestionWithAuthor>, RepoError>;
    async fn questions_by_tag(&self, tag: &str) -> Result<Vec<QuestionWithAuthor>, RepoError>;
    async fn all_tags(&self) -> Result<Vec<String>, RepoError>;

    // --- Answers ---
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, RepoError>;
    async fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<AnswerWithAuthor>, RepoError>;
    /// Owner-scoped conditional update, additionally scoped to the question.
    async fn update_answer(
        &self,
        answer_id: Uuid,
        question_id: Uuid,
        user_id: Uuid,
        changes: AnswerChanges,
    ) -> Result<Option<Answer>, RepoError>;
    /// Owner-scoped conditional delete.
    async fn delete_answer(&self, answer_id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;
    async fn answers_by_user(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Answer>, RepoError>;

    // --- Super admin ---
    /// Deletes every non-superAdmin account (cascading to their content) and
    /// all remaining questions/answers, in one transaction.
    async fn purge_non_super_admin_data(&self) -> Result<(), RepoError>;
}

/// Shared handle to the persistence layer.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// Concrete `Repository` backed by a PgPool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const QUESTION_WITH_AUTHOR_SELECT: &str = r#"
    SELECT q.question_id, q.user_id, q.title, q.description, q.image_link, q.tag,
           u.username, u.email, q.created_at, q.updated_at
    FROM questions q
    JOIN users u ON q.user_id = u.user_id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users
                (user_id, username, firstname, lastname, email, gender, country,
                 agreed_to_terms, role, password)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.gender)
        .bind(&user.country)
        .bind(user.agreed_to_terms)
        .bind(user.role.as_tag())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    /// COALESCE keeps stored values for fields the caller did not provide.
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                firstname = COALESCE($3, firstname),
                lastname = COALESCE($4, lastname),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(changes.username)
        .bind(changes.firstname)
        .bind(changes.lastname)
        .bind(changes.role.map(|r| r.as_tag().to_string()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError> {
        let result =
            sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE user_id = $1")
                .bind(user_id)
                .bind(role.as_tag())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepoError> {
        let result =
            sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE user_id = $1")
                .bind(user_id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question, RepoError> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (question_id, user_id, title, description, tag, image_link)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'not available'))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.user_id)
        .bind(&question.title)
        .bind(&question.description)
        .bind(&question.tag)
        .bind(question.image_link)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_owned_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Question>, RepoError> {
        sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE question_id = $1 AND user_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    /// Single conditional statement: the ownership check and the write are
    /// one atomic operation, so there is no read-then-write window.
    async fn update_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, RepoError> {
        sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                tag = COALESCE($5, tag),
                image_link = COALESCE($6, image_link),
                updated_at = NOW()
            WHERE question_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(question_id)
        .bind(user_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.tag)
        .bind(changes.image_link)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    async fn delete_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<DeletedQuestion>, RepoError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "DELETE FROM questions WHERE question_id = $1 AND user_id = $2 RETURNING image_link",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(image_link,)| DeletedQuestion { image_link }))
    }

    async fn get_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<QuestionWithAuthor>, RepoError> {
        let query = format!("{QUESTION_WITH_AUTHOR_SELECT} WHERE q.question_id = $1");
        sqlx::query_as::<_, QuestionWithAuthor>(&query)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn questions_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let query =
            format!("{QUESTION_WITH_AUTHOR_SELECT} WHERE q.user_id = $1 ORDER BY q.created_at DESC");
        sqlx::query_as::<_, QuestionWithAuthor>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn all_questions(&self) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let query = format!("{QUESTION_WITH_AUTHOR_SELECT} ORDER BY q.created_at DESC");
        sqlx::query_as::<_, QuestionWithAuthor>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn questions_by_tag(&self, tag: &str) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let query =
            format!("{QUESTION_WITH_AUTHOR_SELECT} WHERE q.tag = $1 ORDER BY q.created_at DESC");
        sqlx::query_as::<_, QuestionWithAuthor>(&query)
            .bind(tag)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn all_tags(&self) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT tag FROM questions")
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from)
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, RepoError> {
        sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (answer_id, user_id, question_id, answer, url)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'NOT PROVIDED !'))
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(answer.user_id)
        .bind(answer.question_id)
        .bind(&answer.answer)
        .bind(answer.url)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<AnswerWithAuthor>, RepoError> {
        sqlx::query_as::<_, AnswerWithAuthor>(
            r#"
            SELECT a.answer_id, a.user_id, a.question_id, a.answer, a.url,
                   u.username, u.email, a.created_at, a.updated_at
            FROM answers a
            JOIN users u ON a.user_id = u.user_id
            WHERE a.question_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    async fn update_answer(
        &self,
        answer_id: Uuid,
        question_id: Uuid,
        user_id: Uuid,
        changes: AnswerChanges,
    ) -> Result<Option<Answer>, RepoError> {
        sqlx::query_as::<_, Answer>(
            r#"
            UPDATE answers
            SET answer = COALESCE($4, answer),
                url = COALESCE($5, url),
                updated_at = NOW()
            WHERE answer_id = $1 AND question_id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(answer_id)
        .bind(question_id)
        .bind(user_id)
        .bind(changes.answer)
        .bind(changes.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    async fn delete_answer(&self, answer_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM answers WHERE answer_id = $1 AND user_id = $2")
            .bind(answer_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn answers_by_user(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Answer>, RepoError> {
        sqlx::query_as::<_, Answer>(
            "SELECT * FROM answers WHERE question_id = $1 AND user_id = $2 ORDER BY created_at ASC",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    async fn purge_non_super_admin_data(&self) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        // Cascades remove the deleted users' questions and answers; the two
        // follow-up deletes clear content owned by surviving accounts.
        sqlx::query("DELETE FROM users WHERE role <> $1")
            .bind(Role::SuperAdmin.as_tag())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM answers").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM questions").execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}
