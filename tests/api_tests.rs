mod common;

use common::{spawn_app, test_token};
use qa_platform::Role;
use uuid::Uuid;

async fn register_and_token(address: &str, client: &reqwest::Client, email: &str) -> String {
    let response = client
        .post(format!("{address}/users/register"))
        .json(&serde_json::json!({
            "username": "tester",
            "firstname": "Test",
            "lastname": "User",
            "email": email,
            "gender": "female",
            "country": "Ireland",
            "agreed_to_terms": true,
            "password": "Valid@123"
        }))
        .send()
        .await
        .expect("register failed");
    assert_eq!(response.status(), 200);

    response
        .headers()
        .get("authorization")
        .expect("no Authorization header on register")
        .to_str()
        .unwrap()
        .strip_prefix("Bearer ")
        .expect("header is not a bearer token")
        .to_string()
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn register_then_login_issues_usable_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let register_token = register_and_token(&app.address, &client, "flow@example.com").await;
    assert!(!register_token.is_empty());

    let response = client
        .post(format!("{}/users/login", app.address))
        .json(&serde_json::json!({
            "email": "flow@example.com",
            "password": "Valid@123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let login_token = response
        .headers()
        .get("authorization")
        .expect("no Authorization header on login")
        .to_str()
        .unwrap()
        .strip_prefix("Bearer ")
        .unwrap()
        .to_string();

    // The login token opens the authenticated tier (empty result set is 404
    // here, which still proves the gate was passed).
    let response = client
        .get(format!("{}/questions/getAllQuestion", app.address))
        .header("Authorization", format!("Bearer {login_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn authenticated_tier_rejects_missing_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/questions/getAllQuestion", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0], "You are not Authorized");
}

#[tokio::test]
async fn staff_tier_rejects_plain_users() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = register_and_token(&app.address, &client, "plain@example.com").await;

    let response = client
        .get(format!("{}/users/allUsers", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"][0],
        "Access denied. Insufficient permissions."
    );
}

#[tokio::test]
async fn staff_tier_admits_admin_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_token(&app.address, &client, "somebody@example.com").await;
    let admin_token = test_token(Uuid::new_v4(), "admin", Role::Admin);

    let response = client
        .get(format!("{}/users/allUsers", app.address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn question_updates_are_owner_only_end_to_end() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let owner_token = register_and_token(&app.address, &client, "owner@example.com").await;
    let other_token = register_and_token(&app.address, &client, "other@example.com").await;

    let response = client
        .post(format!("{}/questions/createQuestion", app.address))
        .header("Authorization", format!("Bearer {owner_token}"))
        .json(&serde_json::json!({
            "title": "Why is my future not Send?",
            "description": "Async trait object trouble",
            "tag": "rust"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Fetch the new question's id back through the owner's listing.
    let response = client
        .get(format!("{}/questions/getQuestionByUser", app.address))
        .header("Authorization", format!("Bearer {owner_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let question_id = body["questions"][0]["questionId"].as_str().unwrap().to_string();

    // Someone else's update attempt: 404, not 403.
    let response = client
        .patch(format!(
            "{}/questions/updateQuestion/{question_id}",
            app.address
        ))
        .header("Authorization", format!("Bearer {other_token}"))
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The owner's identical update succeeds.
    let response = client
        .patch(format!(
            "{}/questions/updateQuestion/{question_id}",
            app.address
        ))
        .header("Authorization", format!("Bearer {owner_token}"))
        .json(&serde_json::json!({ "title": "Why is my future not Send? (solved)" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn answer_lifecycle_over_the_wire() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = register_and_token(&app.address, &client, "answerer@example.com").await;

    client
        .post(format!("{}/questions/createQuestion", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({
            "title": "Best crate for CLI parsing?",
            "description": "Looking for recommendations",
            "tag": "cli"
        }))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .get(format!("{}/questions/getQuestionByUser", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let question_id = body["questions"][0]["questionId"].as_str().unwrap().to_string();

    // Answer with a URL that violates the required prefix.
    let response = client
        .post(format!(
            "{}/answers/createAnswer/{question_id}",
            app.address
        ))
        .header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({
            "answer": "Use clap.",
            "url": "http://example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!(
            "{}/answers/createAnswer/{question_id}",
            app.address
        ))
        .header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({
            "answer": "Use clap.",
            "url": "https://www.example.com/docs"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let answers: serde_json::Value = client
        .get(format!("{}/answers/getAnswer/{question_id}", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answers.as_array().unwrap().len(), 1);
    assert_eq!(answers[0]["answer"], "Use clap.");
    assert_eq!(answers[0]["username"], "tester");
}

#[tokio::test]
async fn cleanup_requires_the_super_admin_role() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register_and_token(&app.address, &client, "victim@example.com").await;

    // Staff is not enough.
    let admin_token = test_token(Uuid::new_v4(), "admin", Role::Admin);
    let response = client
        .get(format!("{}/superAdmin/superAdmCleanUp", app.address))
        .header("Authorization", format!("Bearer {admin_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(app.repo.user_count(), 1);

    let super_token = test_token(Uuid::new_v4(), "superAdmin", Role::SuperAdmin);
    let response = client
        .get(format!("{}/superAdmin/superAdmCleanUp", app.address))
        .header("Authorization", format!("Bearer {super_token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"][0], "Database cleaned up successfully.");
    assert_eq!(app.repo.user_count(), 0);
}

#[tokio::test]
async fn openapi_document_describes_the_raw_image_upload() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let doc: serde_json::Value = response.json().await.unwrap();
    let upload = &doc["paths"]["/questions/uploadImage"]["post"];
    assert!(!upload.is_null(), "uploadImage missing from the document");
    // The body is raw bytes with an image content type, not a JSON schema.
    assert!(
        !upload["requestBody"]["content"]["image/png"].is_null(),
        "uploadImage request body should be declared as image/png"
    );
}

#[tokio::test]
async fn image_upload_and_retrieval() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = register_and_token(&app.address, &client, "uploader@example.com").await;

    // Unsupported content type is refused.
    let response = client
        .post(format!(
            "{}/questions/uploadImage?filename=notes.txt",
            app.address
        ))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!(
            "{}/questions/uploadImage?filename=diagram.png",
            app.address
        ))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "image/png")
        .body(vec![0x89, 0x50, 0x4E, 0x47])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let link = body["imageLink"].as_str().unwrap().to_string();

    // Retrieval is public: no token needed.
    let response = client
        .get(format!("{}/questions/getImage/{link}", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");

    let response = client
        .get(format!("{}/questions/getImage/no-such-file.png", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
