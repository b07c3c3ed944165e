#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use ledblast::auth::{create_jwt, hash_password};
use ledblast::config::Config;
use ledblast::domain::{NewUser, Role};
use ledblast::{db, server, AppState};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub dir: TempDir,
}

pub async fn setup_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        documents_dir: dir.path().join("uploaded_documents"),
        images_dir: dir.path().join("product_images"),
        ..Config::default()
    };
    (AppState::new(db, config), dir)
}

pub async fn spawn_app() -> TestApp {
    let (state, dir) = setup_state().await;
    TestApp {
        app: server::build_router(state.clone()),
        state,
        dir,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// Insert a user directly and return a bearer token for it
    pub async fn user_with_role(&self, username: &str, role: Role) -> (i32, String) {
        let user = self
            .state
            .user_repo
            .create(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: hash_password("password123").unwrap(),
                role,
            })
            .await
            .expect("Failed to create user");
        let token = create_jwt(user.id, &user.username, role).unwrap();
        (user.id, token)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .header("user-agent", "ledblast-tests");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get(uri: &str, token: &str) -> Request<Body> {
    empty_request("GET", uri, Some(token))
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_request(uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    let boundary = "ledblast-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}
