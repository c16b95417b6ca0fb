// tests/common/mod.rs
//
// App completo sobre os colaboradores em memória, exercitado via `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use dispatchiq::{
    config::Settings,
    routes::create_router,
    test_helpers::{test_app_state, test_settings, TestBackends, TEST_OTP},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

pub struct TestApp {
    pub router: Router,
    pub fakes: TestBackends,
}

/// Usuário cadastrado, verificado e logado.
pub struct Session {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        // Limite alto para que os testes comuns nunca esbarrem no rate limiter.
        let mut settings = test_settings();
        settings.rate_limit_per_minute = 1_000;
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        let (state, fakes) = test_app_state(settings).expect("estado de teste");
        Self { router: create_router(state), fakes }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("resposta");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("corpo").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("requisição");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn signup(&self, email: &str) -> (StatusCode, Value) {
        self.post(
            "/api/v1/auth/signup",
            None,
            json!({
                "email": email,
                "password": STRONG_PASSWORD,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "company_name": "Lovelace Properties"
            }),
        )
        .await
    }

    pub async fn signin(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post("/api/v1/auth/signin", None, json!({ "email": email, "password": password })).await
    }

    /// Cadastro -> código de verificação -> login.
    pub async fn verified_session(&self, email: &str) -> Session {
        let (status, body) = self.signup(email).await;
        assert_eq!(status, StatusCode::CREATED, "signup: {}", body);

        let (status, body) = self
            .post("/api/v1/auth/verify-otp", None, json!({ "email": email, "code": TEST_OTP }))
            .await;
        assert_eq!(status, StatusCode::OK, "verify-otp: {}", body);

        let (status, body) = self.signin(email, STRONG_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "signin: {}", body);
        session_from(&body, email)
    }

    pub async fn create_property(&self, token: &str, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/v1/properties",
                Some(token),
                json!({ "name": name, "address": format!("{} Main St", name) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create property: {}", body);
        uuid_at(&body, "id")
    }
}

pub fn session_from(body: &Value, email: &str) -> Session {
    Session {
        user_id: uuid_at(body, "user_id"),
        company_id: uuid_at(body, "company_id"),
        email: email.to_string(),
        access_token: body["access_token"].as_str().expect("access_token").to_string(),
        refresh_token: body["refresh_token"].as_str().expect("refresh_token").to_string(),
    }
}

pub fn uuid_at(body: &Value, key: &str) -> Uuid {
    body[key]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("campo {} ausente em {}", key, body))
}
