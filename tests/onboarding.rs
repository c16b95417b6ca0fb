// tests/onboarding.rs

mod common;

use axum::http::StatusCode;
use common::{TestApp, STRONG_PASSWORD};
use dispatchiq::clients::{IdentityProvider, NewIdentity};
use serde_json::{json, Value};

fn payload() -> Value {
    json!({
        "companyName": "Maple Holdings",
        "timezone": "Eastern (Detroit)",
        "workHoursStart": "09:00",
        "workHoursEnd": "17:00:00",
        "onCallEnabled": true,
        "properties": [
            { "name": "Maple Court", "address": "1 Maple Ave" },
            { "name": "Oak Tower", "address": "2 Oak St", "notes": "gate code 1234" }
        ],
        "technicians": [
            { "firstName": "Tom", "lastName": "Fixer", "defaultProperty": "maple court" },
            { "firstName": "Ann", "lastName": "Able", "defaultProperty": "none" }
        ],
        "emergencyVendors": [
            { "category": "plumbing", "name": "Pipes Inc", "phone": "555-0100" }
        ]
    })
}

#[tokio::test]
async fn completes_once_and_normalizes_hours() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let (status, body) = app.post("/api/v1/onboarding", Some(&session.access_token), payload()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["company_id"], session.company_id.to_string());

    let summary = &body["summary"];
    assert_eq!(summary["company_name"], "Maple Holdings");
    assert_eq!(summary["timezone"], "America/Detroit");
    assert_eq!(summary["work_hours_start"], "09:00");
    assert_eq!(summary["work_hours_end"], "17:00");
    assert_eq!(summary["intake_method"], "manual");
    assert_eq!(summary["on_call_rotation"], "weekly");
    assert_eq!(summary["properties_total"], 2);
    assert_eq!(summary["technicians_total"], 2);
    assert_eq!(summary["emergency_vendors_total"], 1);
    assert_eq!(summary["admin_user_created"], false);

    // Não é repetível.
    let (status, _) = app.post("/api/v1/onboarding", Some(&session.access_token), payload()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // O login passa a reportar a empresa como configurada.
    let (_, signin) = app.signin("owner@example.com", STRONG_PASSWORD).await;
    assert_eq!(signin["is_onboarded"], true);
}

#[tokio::test]
async fn status_reflects_the_stored_configuration() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let (_, before) = app.get("/api/v1/onboarding", &session.access_token).await;
    assert_eq!(before["onboarding_completed"], false);
    assert_eq!(before["work_hours_start"], "00:00");

    app.post("/api/v1/onboarding", Some(&session.access_token), payload()).await;

    let (status, body) = app.get("/api/v1/onboarding", &session.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["onboarding_completed"], true);
    assert_eq!(body["timezone"], "America/Detroit");
    assert_eq!(body["timezone_label"], "Eastern (Detroit)");
    assert_eq!(body["work_hours_start"], "09:00");
    assert_eq!(body["work_hours_end"], "17:00");
    assert_eq!(body["on_call_enabled"], true);

    // Técnicos por sobrenome; a referência por nome virou a propriedade criada.
    let technicians = body["technicians"].as_array().unwrap();
    assert_eq!(technicians[0]["last_name"], "Able");
    assert!(technicians[0]["default_property_id"].is_null());
    assert_eq!(technicians[1]["last_name"], "Fixer");
    assert_eq!(technicians[1]["default_property_name"], "Maple Court");

    let properties = body["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[1]["notes"], "gate code 1234");
    assert_eq!(body["emergency_vendors"][0]["category"], "plumbing");
}

#[tokio::test]
async fn unknown_property_reference_writes_nothing() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let mut body = payload();
    body["technicians"][0]["defaultProperty"] = json!("Birch Villas");

    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["error"].as_str().unwrap().contains("Birch Villas"));

    let (_, status_body) = app.get("/api/v1/onboarding", &session.access_token).await;
    assert_eq!(status_body["onboarding_completed"], false);
    assert_eq!(status_body["company_name"], "Lovelace Properties");
}

#[tokio::test]
async fn technician_may_reference_an_existing_company_property() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let other = app.verified_session("other@example.com").await;
    let foreign = app.create_property(&other.access_token, "Foreign Place").await;

    let body = json!({
        "workHoursStart": "08:30",
        "workHoursEnd": "16:30",
        "technicians": [{ "firstName": "Tom", "lastName": "Fixer", "defaultProperty": foreign.to_string() }]
    });
    let (status, _) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn rejects_bad_times_and_timezones() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let mut body = payload();
    body["workHoursStart"] = json!("25:00");
    let (status, _) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = payload();
    body["timezone"] = json!("Mars/Olympus");
    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["error"].as_str().unwrap().contains("Mars/Olympus"));

    let mut body = payload();
    body["emergencyVendors"][0]["category"] = json!("roofing");
    let (status, _) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provisions_a_secondary_admin() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let mut body = payload();
    body["adminAccount"] = json!({ "email": "Ops@Example.com", "password": "Adm1n!Pass" });

    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    assert_eq!(response["summary"]["admin_user_created"], true);

    let admin = app.fakes.identity.find_by_email("ops@example.com").await.expect("admin");
    assert!(admin.email_confirmed());
    let profile = app.fakes.store.app_user(admin.id).await.expect("perfil do admin");
    assert_eq!(profile.company_id, Some(session.company_id));
    assert_eq!(profile.first_name.as_deref(), Some("Company"));
    assert_eq!(app.fakes.identity.magic_links().await, vec!["ops@example.com".to_string()]);
}

#[tokio::test]
async fn admin_equal_to_the_caller_is_ignored() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let mut body = payload();
    body["adminAccount"] = json!({ "email": "OWNER@example.com", "password": "whatever1" });

    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    assert_eq!(response["summary"]["admin_user_created"], false);
    assert_eq!(app.fakes.identity.user_count().await, 1);
}

#[tokio::test]
async fn admin_from_another_company_is_refused_before_writes() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let rival = app.verified_session("rival@example.com").await;

    let mut body = payload();
    body["adminAccount"] = json!({ "email": "Rival@Example.com", "password": "Adm1n!Pass" });

    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", response);
    assert!(response["error"].as_str().unwrap().contains("rival@example.com"));

    let profile = app.fakes.store.app_user(rival.user_id).await.unwrap();
    assert_eq!(profile.company_id, Some(rival.company_id));
    let (_, status_body) = app.get("/api/v1/onboarding", &session.access_token).await;
    assert_eq!(status_body["onboarding_completed"], false);
    assert_eq!(status_body["company_name"], "Lovelace Properties");
}

#[tokio::test]
async fn existing_identity_is_linked_even_past_the_first_page() {
    let app = TestApp::new();
    app.fakes.identity.set_admin_page_size(2);
    let session = app.verified_session("owner@example.com").await;
    for email in ["aaa@example.com", "bbb@example.com", "zed@example.com"] {
        app.fakes
            .identity
            .admin_create_user(&NewIdentity {
                email: email.to_string(),
                password: "Adm1n!Pass".to_string(),
                email_confirm: true,
                user_metadata: json!({}),
            })
            .await
            .unwrap();
    }

    let mut body = payload();
    body["adminAccount"] = json!({ "email": "zed@example.com", "password": "Adm1n!Pass" });

    let (status, response) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    assert_eq!(response["summary"]["admin_user_created"], false);
    assert_eq!(app.fakes.identity.user_count().await, 4);
    assert!(app.fakes.identity.magic_links().await.is_empty());

    let zed = app.fakes.identity.find_by_email("zed@example.com").await.unwrap();
    let profile = app.fakes.store.app_user(zed.id).await.expect("perfil do admin");
    assert_eq!(profile.company_id, Some(session.company_id));
}

#[tokio::test]
async fn weak_admin_password_is_rejected_before_writes() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let mut body = payload();
    body["adminAccount"] = json!({ "email": "ops@example.com", "password": "password1" });

    let (status, _) = app.post("/api/v1/onboarding", Some(&session.access_token), body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.fakes.identity.find_by_email("ops@example.com").await.is_none());

    let (_, status_body) = app.get("/api/v1/onboarding", &session.access_token).await;
    assert_eq!(status_body["onboarding_completed"], false);
}

#[tokio::test]
async fn unconfirmed_users_cannot_onboard() {
    let app = TestApp::new();
    app.signup("early@example.com").await;
    let (_, signin) = app.signin("early@example.com", STRONG_PASSWORD).await;
    let token = signin["access_token"].as_str().unwrap();

    let (status, _) = app.post("/api/v1/onboarding", Some(token), payload()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
