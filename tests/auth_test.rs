mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::json;

use common::{empty_request, get, json_request, spawn_app, TestApp};
use ledblast::auth::{legacy_digest, verify_password};
use ledblast::domain::{AuditFilter, Role};
use ledblast::infrastructure::login_guard::HumanVerifier;
use ledblast::models::user;
use ledblast::server;

fn registration(username: &str, email: &str, password: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": email,
        "password": password,
        "confirm_password": password,
        "accept_terms": true
    })
}

async fn login(app: &TestApp, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.send(json_request(
        "POST",
        "/api/auth/login",
        None,
        json!({ "username": username, "password": password }),
    ))
    .await
}

#[tokio::test]
async fn register_then_login_succeeds() {
    let app = spawn_app().await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("ana", "ana@example.com", "s3cret!"),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["user"]["role"], "Vizualizator");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = login(&app, "ana", "s3cret!").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["user"]["last_login"].is_string());

    // Email works as the identifier too
    let (status, _) = login(&app, "ana@example.com", "s3cret!").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_counts_attempts_and_asks_for_captcha() {
    let app = spawn_app().await;
    app.send(json_request(
        "POST",
        "/api/auth/register",
        None,
        registration("bob", "bob@example.com", "right-pass"),
    ))
    .await;

    let (status, body) = login(&app, "bob", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["failed_attempts"], 1);
    assert_eq!(body["captcha_required"], false);

    let (status, body) = login(&app, "bob", "wrong again").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["failed_attempts"], 2);
    assert_eq!(body["captcha_required"], true);

    // The simulated bot check passes, so the right password still gets in
    let (status, _) = login(&app, "bob", "right-pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state.login_guard.failures("bob"), 0);

    let failures = app
        .state
        .audit_repo
        .find_all(AuditFilter {
            action_type: Some("LOGIN_FAILED".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].ip_address.as_deref(), Some("203.0.113.9"));
}

struct RejectingVerifier;

#[async_trait]
impl HumanVerifier for RejectingVerifier {
    async fn verify(&self, _token: Option<&str>) -> bool {
        false
    }
}

#[tokio::test]
async fn failed_bot_check_blocks_third_attempt() {
    let base = spawn_app().await;
    let state = base.state.clone().with_verifier(Arc::new(RejectingVerifier));
    let app = TestApp {
        app: server::build_router(state.clone()),
        state,
        dir: base.dir,
    };
    app.user_with_role("carol", Role::Editor).await;

    login(&app, "carol", "nope").await;
    login(&app, "carol", "nope").await;

    let (status, _) = login(&app, "carol", "password123").await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
}

#[tokio::test]
async fn registering_an_existing_email_updates_the_row() {
    let app = spawn_app().await;

    app.send(json_request(
        "POST",
        "/api/auth/register",
        None,
        registration("first", "shared@example.com", "pass-one"),
    ))
    .await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("second", "shared@example.com", "pass-two"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);

    let count = user::Entity::find().count(app.state.db()).await.unwrap();
    assert_eq!(count, 1);

    let (status, _) = login(&app, "second", "pass-two").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&app, "first", "pass-one").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mixed_case_email_logs_in_as_typed() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("ana", "Ana@Example.com", "pw"),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = login(&app, "Ana@Example.com", "pw").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let (status, _) = login(&app, "ana@example.com", "pw").await;
    assert_eq!(status, StatusCode::OK);

    // Same address in another case updates the row
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            registration("ana", "ANA@example.COM", "pw2"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "Ana@Example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rows_stored_with_mixed_case_email_still_match() {
    let app = spawn_app().await;

    user::ActiveModel {
        username: Set("legacy".to_string()),
        email: Set("Legacy@Example.com".to_string()),
        password_hash: Set(legacy_digest("old-pass")),
        role: Set("Editor".to_string()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(app.state.db())
    .await
    .unwrap();

    let (status, _) = login(&app, "legacy@example.com", "old-pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registration_is_validated_before_writing() {
    let app = spawn_app().await;

    let mut mismatch = registration("dan", "dan@example.com", "aaa111");
    mismatch["confirm_password"] = json!("bbb222");
    let (status, body) = app
        .send(json_request("POST", "/api/auth/register", None, mismatch))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let mut no_terms = registration("dan", "dan@example.com", "aaa111");
    no_terms["accept_terms"] = json!(false);
    let (status, _) = app
        .send(json_request("POST", "/api/auth/register", None, no_terms))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = login(&app, "", "whatever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let count = user::Entity::find().count(app.state.db()).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn forgot_password_only_for_known_emails() {
    let app = spawn_app().await;
    app.user_with_role("erin", Role::Viewer).await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "erin@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "ghost@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let logged = app
        .state
        .audit_repo
        .find_all(AuditFilter {
            action_type: Some("PASSWORD_RESET_REQUEST".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(logged.len(), 1);
}

#[tokio::test]
async fn capabilities_gate_every_route() {
    let app = spawn_app().await;
    let (_, viewer) = app.user_with_role("viewer", Role::Viewer).await;
    let (_, editor) = app.user_with_role("editor", Role::Editor).await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, _) = app
        .send(empty_request("GET", "/api/products", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(empty_request("GET", "/api/products", Some("garbage")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(get("/api/products", &viewer)).await;
    assert_eq!(status, StatusCode::OK);

    let supplier = json!({ "name": "Acme" });
    let (status, _) = app
        .send(json_request("POST", "/api/suppliers", Some(&viewer), supplier.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(json_request("POST", "/api/suppliers", Some(&editor), supplier))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/suppliers/{}", id), Some(&editor)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(get("/api/users", &editor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(get("/api/audit", &editor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/suppliers/{}", id), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn me_lists_pages_for_the_role() {
    let app = spawn_app().await;
    let (_, viewer) = app.user_with_role("viewer", Role::Viewer).await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, body) = app.send(get("/api/auth/me", &viewer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Vizualizator");
    assert_eq!(
        body["pages"],
        json!(["dashboard", "suppliers", "products", "documents"])
    );
    assert_eq!(body["permissions"], json!(["view_inventory"]));

    let (_, body) = app.send(get("/api/auth/me", &admin)).await;
    assert!(body["pages"]
        .as_array()
        .unwrap()
        .contains(&json!("user_management")));
}

#[tokio::test]
async fn deactivated_accounts_lose_access() {
    let app = spawn_app().await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;
    let (id, editor) = app.user_with_role("temp", Role::Editor).await;

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{}/status", id),
            Some(&admin),
            json!({ "is_active": false }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = app.send(get("/api/products", &editor)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "temp", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn legacy_sha256_hash_logs_in_and_is_upgraded() {
    let app = spawn_app().await;
    user::ActiveModel {
        username: Set("old".into()),
        email: Set("old@example.com".into()),
        password_hash: Set(legacy_digest("legacy-pass")),
        role: Set("Editor".into()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(app.state.db())
    .await
    .unwrap();

    let (status, _) = login(&app, "old", "legacy-pass").await;
    assert_eq!(status, StatusCode::OK);

    let row = app
        .state
        .user_repo
        .find_by_username("old")
        .await
        .unwrap()
        .unwrap();
    assert!(row.password_hash.starts_with("$argon2"));
    assert!(verify_password("legacy-pass", &row.password_hash).unwrap());
}

#[tokio::test]
async fn admin_user_management() {
    let app = spawn_app().await;
    let (admin_id, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/users",
            Some(&admin),
            json!({ "username": "newbie", "email": "newbie@example.com", "role": "Editor" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let generated = body["generated_password"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_i64().unwrap();
    let (status, _) = login(&app, "newbie", &generated).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{}/role", id),
            Some(&admin),
            json!({ "role": "Vizualizator" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Vizualizator");

    let (_, body) = app
        .send(get("/api/users?role=Vizualizator", &admin))
        .await;
    assert_eq!(body["total"], 1);

    let (status, body) = app
        .send(empty_request(
            "POST",
            &format!("/api/users/{}/reset-password", id),
            Some(&admin),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset = body["generated_password"].as_str().unwrap().to_string();
    let (status, _) = login(&app, "newbie", &generated).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "newbie", &reset).await;
    assert_eq!(status, StatusCode::OK);

    // Admins cannot lock themselves out
    let (status, _) = app
        .send(empty_request(
            "DELETE",
            &format!("/api/users/{}", admin_id),
            Some(&admin),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{}/role", admin_id),
            Some(&admin),
            json!({ "role": "Editor" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/users/{}", id), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = app.send(get("/api/users", &admin)).await;
    assert_eq!(body["total"], 1);
}
