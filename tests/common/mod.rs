#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

use qa_platform::{
    AppConfig, AppState, MockImageStore, MockMailer, Role, create_router,
    auth::issue_token,
    models::{Answer, AnswerWithAuthor, Question, QuestionWithAuthor, UserRecord},
    repository::{
        AnswerChanges, DeletedQuestion, NewAnswer, NewQuestion, NewUser, ProfileChanges,
        QuestionChanges, RepoError, Repository,
    },
};

/// In-memory `Repository` with the same observable semantics as the Postgres
/// implementation: duplicate-email rejection, owner-scoped conditional
/// writes, and foreign-key enforcement on answers.
#[derive(Default)]
pub struct MockRepo {
    users: Mutex<Vec<UserRecord>>,
    questions: Mutex<Vec<Question>>,
    answers: Mutex<Vec<Answer>>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn question_count(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn with_author(&self, question: &Question) -> QuestionWithAuthor {
        let users = self.users.lock().unwrap();
        let author = users.iter().find(|u| u.user_id == question.user_id);
        QuestionWithAuthor {
            question_id: question.question_id,
            user_id: question.user_id,
            title: question.title.clone(),
            description: question.description.clone(),
            image_link: question.image_link.clone(),
            tag: question.tag.clone(),
            username: author.map(|u| u.username.clone()).unwrap_or_default(),
            email: author.map(|u| u.email.clone()).unwrap_or_default(),
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }

    fn answer_with_author(&self, answer: &Answer) -> AnswerWithAuthor {
        let users = self.users.lock().unwrap();
        let author = users.iter().find(|u| u.user_id == answer.user_id);
        AnswerWithAuthor {
            answer_id: answer.answer_id,
            user_id: answer.user_id,
            question_id: answer.question_id,
            answer: answer.answer.clone(),
            url: answer.url.clone(),
            username: author.map(|u| u.username.clone()).unwrap_or_default(),
            email: author.map(|u| u.email.clone()).unwrap_or_default(),
            created_at: answer.created_at,
            updated_at: answer.updated_at,
        }
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = Utc::now();
        let record = UserRecord {
            user_id: Uuid::new_v4(),
            username: user.username,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            gender: user.gender,
            country: user.country,
            agreed_to_terms: user.agreed_to_terms,
            role: user.role.as_tag().to_string(),
            password: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<bool, RepoError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                if let Some(username) = changes.username {
                    user.username = username;
                }
                if let Some(firstname) = changes.firstname {
                    user.firstname = firstname;
                }
                if let Some(lastname) = changes.lastname {
                    user.lastname = lastname;
                }
                if let Some(role) = changes.role {
                    user.role = role.as_tag().to_string();
                }
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_role(&self, user_id: Uuid, role: Role) -> Result<bool, RepoError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.role = role.as_tag().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepoError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.user_id != user_id);
        let deleted = users.len() < before;
        if deleted {
            // Mirror the CASCADE.
            self.questions
                .lock()
                .unwrap()
                .retain(|q| q.user_id != user_id);
            self.answers.lock().unwrap().retain(|a| a.user_id != user_id);
        }
        Ok(deleted)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question, RepoError> {
        let now = Utc::now();
        let record = Question {
            question_id: Uuid::new_v4(),
            user_id: question.user_id,
            title: question.title,
            description: question.description,
            image_link: Some(
                question
                    .image_link
                    .unwrap_or_else(|| "not available".to_string()),
            ),
            tag: question.tag,
            created_at: now,
            updated_at: now,
        };
        self.questions.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_owned_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Question>, RepoError> {
        Ok(self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.question_id == question_id && q.user_id == user_id)
            .cloned())
    }

    async fn update_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
        changes: QuestionChanges,
    ) -> Result<Option<Question>, RepoError> {
        let mut questions = self.questions.lock().unwrap();
        match questions
            .iter_mut()
            .find(|q| q.question_id == question_id && q.user_id == user_id)
        {
            Some(question) => {
                if let Some(title) = changes.title {
                    question.title = title;
                }
                if let Some(description) = changes.description {
                    question.description = description;
                }
                if let Some(tag) = changes.tag {
                    question.tag = tag;
                }
                if let Some(image_link) = changes.image_link {
                    question.image_link = Some(image_link);
                }
                question.updated_at = Utc::now();
                Ok(Some(question.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_question(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<DeletedQuestion>, RepoError> {
        let mut questions = self.questions.lock().unwrap();
        let index = questions
            .iter()
            .position(|q| q.question_id == question_id && q.user_id == user_id);
        match index {
            Some(index) => {
                let removed = questions.remove(index);
                self.answers
                    .lock()
                    .unwrap()
                    .retain(|a| a.question_id != question_id);
                Ok(Some(DeletedQuestion {
                    image_link: removed.image_link,
                }))
            }
            None => Ok(None),
        }
    }

    async fn get_question(
        &self,
        question_id: Uuid,
    ) -> Result<Option<QuestionWithAuthor>, RepoError> {
        let question = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.question_id == question_id)
            .cloned();
        Ok(question.map(|q| self.with_author(&q)))
    }

    async fn questions_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let questions: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        Ok(questions.iter().map(|q| self.with_author(q)).collect())
    }

    async fn all_questions(&self) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let mut questions = self.questions.lock().unwrap().clone();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions.iter().map(|q| self.with_author(q)).collect())
    }

    async fn questions_by_tag(&self, tag: &str) -> Result<Vec<QuestionWithAuthor>, RepoError> {
        let questions: Vec<Question> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.tag == tag)
            .cloned()
            .collect();
        Ok(questions.iter().map(|q| self.with_author(q)).collect())
    }

    async fn all_tags(&self) -> Result<Vec<String>, RepoError> {
        let mut tags: Vec<String> = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.tag.clone())
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, RepoError> {
        let question_exists = self
            .questions
            .lock()
            .unwrap()
            .iter()
            .any(|q| q.question_id == answer.question_id);
        if !question_exists {
            return Err(RepoError::MissingParent);
        }
        let now = Utc::now();
        let record = Answer {
            answer_id: Uuid::new_v4(),
            user_id: answer.user_id,
            question_id: answer.question_id,
            answer: answer.answer,
            url: Some(answer.url.unwrap_or_else(|| "NOT PROVIDED !".to_string())),
            created_at: now,
            updated_at: now,
        };
        self.answers.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn answers_for_question(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<AnswerWithAuthor>, RepoError> {
        let answers: Vec<Answer> = self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect();
        Ok(answers.iter().map(|a| self.answer_with_author(a)).collect())
    }

    async fn update_answer(
        &self,
        answer_id: Uuid,
        question_id: Uuid,
        user_id: Uuid,
        changes: AnswerChanges,
    ) -> Result<Option<Answer>, RepoError> {
        let mut answers = self.answers.lock().unwrap();
        match answers.iter_mut().find(|a| {
            a.answer_id == answer_id && a.question_id == question_id && a.user_id == user_id
        }) {
            Some(answer) => {
                if let Some(text) = changes.answer {
                    answer.answer = text;
                }
                if let Some(url) = changes.url {
                    answer.url = Some(url);
                }
                answer.updated_at = Utc::now();
                Ok(Some(answer.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_answer(&self, answer_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let mut answers = self.answers.lock().unwrap();
        let before = answers.len();
        answers.retain(|a| !(a.answer_id == answer_id && a.user_id == user_id));
        Ok(answers.len() < before)
    }

    async fn answers_by_user(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Answer>, RepoError> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.question_id == question_id && a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn purge_non_super_admin_data(&self) -> Result<(), RepoError> {
        self.users
            .lock()
            .unwrap()
            .retain(|u| u.role == Role::SuperAdmin.as_tag());
        self.answers.lock().unwrap().clear();
        self.questions.lock().unwrap().clear();
        Ok(())
    }
}

/// AppState wired to the in-memory mocks and the default test configuration.
pub fn test_state(repo: Arc<MockRepo>) -> AppState {
    AppState {
        repo,
        storage: Arc::new(MockImageStore::new()),
        mailer: Arc::new(MockMailer::new()),
        config: AppConfig::default(),
    }
}

/// Signs a token with the default test secret, the same one `test_state`
/// puts into the configuration.
pub fn test_token(user_id: Uuid, username: &str, role: Role) -> String {
    issue_token(user_id, username, role, &AppConfig::default().jwt_secret)
        .expect("token signing failed")
}

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MockRepo>,
}

/// Boots the full router on an ephemeral port, backed by the mocks.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(MockRepo::new());
    let router = create_router(test_state(repo.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}
