// tests/auth_flow.rs

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, STRONG_PASSWORD};
use dispatchiq::test_helpers::{test_settings, TEST_OTP};
use serde_json::json;

#[tokio::test]
async fn weak_password_is_rejected_before_any_external_call() {
    let app = TestApp::new();

    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            None,
            json!({
                "email": "weak@example.com",
                "password": "lowercase1only",
                "first_name": "Weak",
                "last_name": "Password",
                "company_name": "Weak Co"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.fakes.identity.user_count().await, 0);
    assert_eq!(app.fakes.store.company_count().await, 0);
}

#[tokio::test]
async fn signup_creates_unconfirmed_identity_company_and_profile() {
    let app = TestApp::new();

    let (status, body) = app.signup("ada@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["confirmed"], false);
    assert_eq!(body["email"], "ada@example.com");

    let user_id = common::uuid_at(&body, "id");
    let profile = app.fakes.store.app_user(user_id).await.expect("app_user");
    assert_eq!(profile.company_id, Some(common::uuid_at(&body, "company_id")));
    assert_eq!(profile.first_name.as_deref(), Some("Ada"));

    // Código de verificação enviado
    let sent = app.fakes.identity.sent_otps().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "ada@example.com");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new();
    app.signup("dup@example.com").await;

    let (status, _) = app.signup("DUP@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.fakes.store.company_count().await, 1);
}

#[tokio::test]
async fn failed_company_creation_removes_the_identity() {
    let app = TestApp::new();
    app.fakes.store.fail_create_company(true);

    let (status, _) = app.signup("rollback@example.com").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.fakes.identity.user_count().await, 0);
}

#[tokio::test]
async fn failed_profile_creation_removes_identity_and_company() {
    let app = TestApp::new();
    app.fakes.store.fail_upsert_app_user(true);

    let (status, _) = app.signup("rollback@example.com").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.fakes.identity.user_count().await, 0);
    assert_eq!(app.fakes.store.company_count().await, 0);
}

#[tokio::test]
async fn signin_before_confirmation_reports_unconfirmed_email() {
    let app = TestApp::new();
    app.signup("early@example.com").await;

    let (status, body) = app.signin("early@example.com", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_confirmed"], false);
    assert_eq!(body["is_onboarded"], false);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    // Autenticado, mas sem acesso aos dados da empresa.
    let (status, _) = app.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/v1/properties", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let app = TestApp::new();
    app.signup("ada@example.com").await;

    let (status, _) = app.signin("ada@example.com", "Wr0ng!Pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn otp_verification_confirms_the_email() {
    let app = TestApp::new();
    app.signup("otp@example.com").await;

    let (status, _) = app
        .post("/api/v1/auth/verify-otp", None, json!({ "email": "otp@example.com", "code": "000000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/auth/verify-otp", None, json!({ "email": "otp@example.com", "token": TEST_OTP }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.signin("otp@example.com", STRONG_PASSWORD).await;
    assert_eq!(body["email_confirmed"], true);
}

#[tokio::test]
async fn otp_code_must_have_six_characters() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/v1/auth/verify-otp", None, json!({ "email": "otp@example.com", "code": "123" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["code"].is_array());
}

#[tokio::test]
async fn legacy_link_verification() {
    let app = TestApp::new();
    app.fakes.identity.set_admin_credential(false);
    let (_, body) = app.signup("link@example.com").await;
    let user_id = common::uuid_at(&body, "id");

    let (status, _) = app.post("/api/v1/auth/verify", None, json!({ "token": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Sem credencial administrativa não há varredura de último recurso.
    let (status, _) = app.post("/api/v1/auth/verify", None, json!({ "token": "garbage" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = app.fakes.identity.issue_link_token(user_id).await;
    let (status, _) = app.post("/api/v1/auth/verify", None, json!({ "token": token })).await;
    assert_eq!(status, StatusCode::OK);

    let identity = app.fakes.identity.find_by_email("link@example.com").await.unwrap();
    assert!(identity.email_confirmed());
}

#[tokio::test]
async fn refresh_rejects_access_tokens() {
    let app = TestApp::new();
    let session = app.verified_session("refresh@example.com").await;

    let (status, _) = app
        .post("/api/v1/auth/refresh", None, json!({ "refresh_token": session.access_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post("/api/v1/auth/refresh", None, json!({ "refreshToken": session.refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    // O novo access token funciona; o refresh token não serve como bearer.
    let new_access = body["access_token"].as_str().unwrap();
    let (status, body) = app.get("/api/v1/auth/me", new_access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["email"], "refresh@example.com");
    assert_eq!(body["profile"]["company_id"], session.company_id.to_string());

    let (status, _) = app.get("/api/v1/auth/me", &session.refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let app = TestApp::new();

    let (status, _) = app.request(Method::GET, "/api/v1/properties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/properties", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provider_issued_tokens_are_accepted() {
    let app = TestApp::new();
    let session = app.verified_session("provider@example.com").await;

    // O provedor falso entrega um token de sessão próprio no login.
    let provider_session = {
        use dispatchiq::clients::IdentityProvider;
        app.fakes
            .identity
            .sign_in_with_password("provider@example.com", STRONG_PASSWORD)
            .await
            .unwrap()
    };
    let token = provider_session.access_token.unwrap();

    let (status, body) = app.get("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["id"], session.user_id.to_string());
}

#[tokio::test]
async fn google_signin_provisions_account_and_company_once() {
    let app = TestApp::new();

    let (status, first) = app
        .post("/api/v1/auth/google-signin", None, json!({ "id_token": "google:grace@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["is_new_user"], true);
    assert_eq!(first["email_confirmed"], true);
    assert!(!first["company_id"].is_null());

    let (status, second) = app
        .post("/api/v1/auth/google-signin", None, json!({ "credential": "google:grace@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["is_new_user"], false);
    assert_eq!(second["company_id"], first["company_id"]);
    assert_eq!(app.fakes.store.company_count().await, 1);

    let user_id = common::uuid_at(&first, "user_id");
    let profile = app.fakes.store.app_user(user_id).await.unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Grace"));
}

#[tokio::test]
async fn google_signin_finds_existing_users_beyond_the_first_page() {
    let app = TestApp::new();
    app.fakes.identity.set_admin_page_size(2);
    for email in ["ana@example.com", "bea@example.com", "cid@example.com", "dan@example.com"] {
        app.signup(email).await;
    }
    let (_, signup) = app.signup("zoe@example.com").await;
    let zoe_id = common::uuid_at(&signup, "id");

    let (status, body) = app
        .post("/api/v1/auth/google-signin", None, json!({ "id_token": "google:zoe@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["is_new_user"], false);
    assert_eq!(common::uuid_at(&body, "user_id"), zoe_id);
    assert_eq!(body["company_id"], signup["company_id"]);
    assert_eq!(app.fakes.identity.user_count().await, 5);
}

#[tokio::test]
async fn admin_scan_reaches_later_pages() {
    let app = TestApp::new();
    app.fakes.identity.set_admin_page_size(2);
    for email in ["ana@example.com", "bea@example.com", "cid@example.com", "dan@example.com"] {
        app.verified_session(email).await;
    }
    app.signup("zoe@example.com").await;

    let (status, _) = app.post("/api/v1/auth/verify", None, json!({ "token": "garbage" })).await;
    assert_eq!(status, StatusCode::OK);
    let zoe = app.fakes.identity.find_by_email("zoe@example.com").await.unwrap();
    assert!(zoe.email_confirmed());
}

#[tokio::test]
async fn google_signin_rejects_bad_tokens() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/v1/auth/google-signin", None, json!({ "id_token": "forged" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_recovery_with_otp() {
    let app = TestApp::new();
    app.verified_session("reset@example.com").await;

    // Sempre 200, exista a conta ou não.
    let (status, _) = app
        .post("/api/v1/auth/forgot-password", None, json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post("/api/v1/auth/forgot-password", None, json!({ "email": "reset@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password-otp",
            None,
            json!({ "email": "reset@example.com", "code": TEST_OTP, "new_password": "weakpassword" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/v1/auth/reset-password-otp",
            None,
            json!({ "email": "reset@example.com", "code": TEST_OTP, "new_password": "N3w!Password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.signin("reset@example.com", STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.signin("reset@example.com", "N3w!Password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sensitive_routes_are_rate_limited_per_client() {
    let mut settings = test_settings();
    settings.rate_limit_per_minute = 2;
    let app = TestApp::with_settings(settings);

    let signin = |ip: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/signin")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(json!({ "email": "x@example.com", "password": "whatever" }).to_string()))
            .unwrap()
    };

    for _ in 0..2 {
        let (status, _) = app.send(signin("10.0.0.1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app.send(signin("10.0.0.1")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    // Outro cliente tem seu próprio balde.
    let (status, _) = app.send(signin("10.0.0.2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let app = TestApp::new();

    let request = |lang: &'static str| {
        Request::builder()
            .method(Method::GET)
            .uri("/api/v1/auth/me")
            .header(header::ACCEPT_LANGUAGE, lang)
            .body(Body::empty())
            .unwrap()
    };

    let (_, en) = app.send(request("en-US,en;q=0.9")).await;
    let (_, pt) = app.send(request("pt-BR,pt;q=0.9")).await;
    let (_, fallback) = app.send(request("fr-FR")).await;

    assert_eq!(en["error"], "Could not validate credentials");
    assert_ne!(pt["error"], en["error"]);
    assert_eq!(fallback["error"], en["error"]);
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = app.request(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/work-orders"].is_object());
    assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
}
