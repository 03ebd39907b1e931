#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use rolegate::{
    ServerConfig, create_app,
    db::Database,
    jwt::JwtConfig,
    mail::MemoryMailer,
    password::hash_password,
};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

pub const ACCESS_SECRET: &[u8] = b"access-secret-for-integration-tests-000";
pub const REFRESH_SECRET: &[u8] = b"refresh-secret-for-integration-tests-000";
pub const FRONTEND_URL: &str = "https://frontend.example.com";
pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub mailer: Arc<MemoryMailer>,
    pub jwt: JwtConfig,
}

/// Build the app on a fresh, seeded in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    db.seed_defaults().await.expect("Failed to seed roles");

    let mailer = Arc::new(MemoryMailer::new());
    let config = ServerConfig {
        db: db.clone(),
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
        frontend_url: Url::parse(FRONTEND_URL).expect("Invalid URL"),
        mailer: mailer.clone(),
    };

    TestApp {
        router: create_app(&config),
        db,
        mailer,
        jwt: JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET),
    }
}

impl TestApp {
    /// Send a request and decode the JSON body (Null if the body is not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn put_json(&self, path: &str, body: Value, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("PUT")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Insert an active user with `PASSWORD` directly. Returns the user UUID.
    pub async fn create_active_user(&self, email: &str, username: &str, role: &str) -> String {
        let role = self.db.roles().get_by_name(role).await.unwrap().unwrap();
        let uuid = uuid::Uuid::new_v4().to_string();
        let hash = hash_password(PASSWORD).unwrap();
        self.db
            .users()
            .create_active(&uuid, email, username, &hash, role.id)
            .await
            .unwrap();
        uuid
    }

    /// Log in and return the full response body.
    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    /// Create an active user with the given role and return an access token.
    pub async fn token_for(&self, role: &str) -> String {
        let email = format!("{}@example.com", role);
        self.create_active_user(&email, role, role).await;
        let (status, body) = self.login(&email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    /// The token embedded in the latest email sent to `to` under `/{path}/`.
    pub fn mailed_token(&self, to: &str, path: &str) -> String {
        let mail = self.mailer.last_to(to).expect("no mail sent");
        let marker = format!("{}/{}/", FRONTEND_URL, path);
        let start = mail.html.find(&marker).expect("link not found") + marker.len();
        mail.html[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }
}

/// A file part for `multipart_body`.
pub struct FilePart<'a> {
    pub name: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub const BOUNDARY: &str = "----rolegate-test-boundary";

/// Encode text fields and file parts as `multipart/form-data`.
pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.name, file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(path: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
