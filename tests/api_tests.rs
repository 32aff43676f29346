use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use filedepot::config::Config;
use filedepot::db::Store;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Seeded by the initial migration.
const ADMIN_EMAIL: &str = "admin@filedepot.local";
const ADMIN_PASSWORD: &str = "change-me";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "integration-test-secret".to_string();

    // A single pooled connection so the in-memory database is shared.
    let store = Store::with_pool_options(&config.general.database_url, 1, 1)
        .await
        .expect("Failed to open store");

    let state = filedepot::api::create_app_state(config, store, None);
    filedepot::api::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": username,
                        "email": email,
                        "password": password,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["access_token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, email: &str, password: &str) -> axum::response::Response {
    let form = format!(
        "username={}&password={}",
        urlencoding::encode(email),
        urlencoding::encode(password)
    );

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_with_token(app: &Router, uri: &str, token: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn user_id_of(app: &Router, token: &str) -> String {
    let response = get_with_token(app, "/api/users/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_issues_token_and_rejects_duplicate_email() {
    let app = spawn_app().await;

    let token = register(&app, "alice", "alice@example.com", "password123").await;
    assert!(!token.is_empty());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "alice-again",
                        "email": "alice@example.com",
                        "password": "password456",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_weak_input() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "bob",
                        "email": "not-an-email",
                        "password": "password123",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "bob",
                        "email": "bob@example.com",
                        "password": "short",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failure_does_not_reveal_which_part_was_wrong() {
    let app = spawn_app().await;
    register(&app, "carol", "carol@example.com", "password123").await;

    let wrong_password = login(&app, "carol@example.com", "not-the-password").await;
    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    let wrong_password_body = body_json(wrong_password).await;

    let unknown_email = login(&app, "nobody@example.com", "password123").await;
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    let unknown_email_body = body_json(unknown_email).await;

    assert_eq!(wrong_password_body["error"], unknown_email_body["error"]);
}

#[tokio::test]
async fn login_succeeds_for_seeded_admin() {
    let app = spawn_app().await;

    let response = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["token_type"], "bearer");
    assert!(json["data"]["access_token"].as_str().is_some());
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with_token(&app, "/api/users/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = register(&app, "dave", "dave@example.com", "password123").await;
    let response = get_with_token(&app, "/api/users/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "dave@example.com");
    assert_eq!(json["data"]["is_admin"], false);
}

#[tokio::test]
async fn user_profile_access_is_self_or_admin() {
    let app = spawn_app().await;

    let token_a = register(&app, "erin", "erin@example.com", "password123").await;
    let token_b = register(&app, "frank", "frank@example.com", "password123").await;
    let id_a = user_id_of(&app, &token_a).await;

    let own = get_with_token(&app, &format!("/api/users/{id_a}"), &token_a).await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = get_with_token(&app, &format!("/api/users/{id_a}"), &token_b).await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    let admin_login = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin_token = body_json(admin_login).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let as_admin = get_with_token(&app, &format!("/api/users/{id_a}"), &admin_token).await;
    assert_eq!(as_admin.status(), StatusCode::OK);

    let own_files = get_with_token(&app, &format!("/api/users/{id_a}/files"), &token_b).await;
    assert_eq!(own_files.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_listing_is_admin_only_and_paginates() {
    let app = spawn_app().await;

    for i in 0..5 {
        register(
            &app,
            &format!("user{i}"),
            &format!("user{i}@example.com"),
            "password123",
        )
        .await;
    }

    let user_token = login(&app, "user0@example.com", "password123").await;
    let user_token = body_json(user_token).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let forbidden = get_with_token(&app, "/api/users", &user_token).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let admin_login = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin_token = body_json(admin_login).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    // 5 registered plus the seeded admin
    let mut seen = std::collections::HashSet::new();
    for offset in [0, 2, 4] {
        let page = get_with_token(
            &app,
            &format!("/api/users?limit=2&offset={offset}"),
            &admin_token,
        )
        .await;
        assert_eq!(page.status(), StatusCode::OK);

        let json = body_json(page).await;
        assert_eq!(json["data"]["total"], 6);
        assert_eq!(json["data"]["limit"], 2);
        assert_eq!(json["data"]["offset"], offset);

        for user in json["data"]["data"].as_array().unwrap() {
            assert!(seen.insert(user["id"].as_str().unwrap().to_string()));
        }
    }
    assert_eq!(seen.len(), 6);
}

#[tokio::test]
async fn change_password_requires_the_old_one() {
    let app = spawn_app().await;

    let token = register(&app, "grace", "grace@example.com", "password123").await;
    let id = user_id_of(&app, &token).await;

    let wrong_old = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{id}/change-password"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "old_password": "wrong-password",
                        "new_password": "new-password-1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong_old.status(), StatusCode::BAD_REQUEST);

    let correct = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{id}/change-password"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "old_password": "password123",
                        "new_password": "new-password-1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(correct.status(), StatusCode::OK);

    let old_login = login(&app, "grace@example.com", "password123").await;
    assert_eq!(old_login.status(), StatusCode::BAD_REQUEST);

    let new_login = login(&app, "grace@example.com", "new-password-1").await;
    assert_eq!(new_login.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_invalidates_their_token_subject() {
    let app = spawn_app().await;

    let token = register(&app, "heidi", "heidi@example.com", "password123").await;
    let id = user_id_of(&app, &token).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The token still verifies but its subject no longer exists.
    let me = get_with_token(&app, "/api/users/me", &token).await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn file_listing_is_admin_only_and_missing_files_are_404() {
    let app = spawn_app().await;

    let token = register(&app, "ivan", "ivan@example.com", "password123").await;

    let forbidden = get_with_token(&app, "/api/files", &token).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let admin_login = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin_token = body_json(admin_login).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let empty = get_with_token(&app, "/api/files", &admin_token).await;
    assert_eq!(empty.status(), StatusCode::OK);
    let json = body_json(empty).await;
    assert_eq!(json["data"]["total"], 0);
    assert_eq!(json["data"]["data"].as_array().unwrap().len(), 0);

    let missing = get_with_token(&app, "/api/files/no-such-id", &token).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let missing_delete = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/files/no-such-id")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing_delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_requires_a_file_part() {
    let app = spawn_app().await;
    let token = register(&app, "judy", "judy@example.com", "password123").await;

    let boundary = "----filedepot-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/files")
                .header("Authorization", format!("Bearer {token}"))
                .header(
                    "Content-Type",
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn insight_routes_return_404_for_missing_resources() {
    let app = spawn_app().await;
    let token = register(&app, "karl", "karl@example.com", "password123").await;

    let generate = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/insights")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "prompt": "Summarize this file",
                        "file_id": "no-such-file",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(generate.status(), StatusCode::NOT_FOUND);

    let get = get_with_token(&app, "/api/insights/no-such-id", &token).await;
    assert_eq!(get.status(), StatusCode::NOT_FOUND);

    let for_file = get_with_token(&app, "/api/files/no-such-file/insights", &token).await;
    assert_eq!(for_file.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_insight_prompt_is_rejected() {
    let app = spawn_app().await;
    let token = register(&app, "mallory", "mallory@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/insights")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "prompt": "   ",
                        "file_id": "irrelevant",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
