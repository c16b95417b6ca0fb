// tests/profile_onboarding.rs

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;
use serde_json::{json, Value};

const BOUNDARY: &str = "dispatchiq-test-boundary";

fn multipart_upload(token: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", field, filename).as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/onboarding/owner/pma")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn subcontractor(services: Value) -> Value {
    json!({
        "businessName": "Cool Air LLC",
        "serviceRadiusMiles": 25,
        "locations": [{ "address": "10 Elm St", "city": "Detroit", "isPrimary": true }],
        "services": services
    })
}

#[tokio::test]
async fn unknown_service_category_is_named_in_the_error() {
    let app = TestApp::new();
    let session = app.verified_session("sub@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/onboarding/subcontractor",
            Some(&session.access_token),
            subcontractor(json!([{ "category_id": "hvac" }])),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("hvac"));
    let profile = app.fakes.store.app_user(session.user_id).await.unwrap();
    assert_eq!(profile.onboarding_status, "pending");
}

#[tokio::test]
async fn subcontractor_resolves_categories_by_slug_name_or_id() {
    let app = TestApp::new();
    let session = app.verified_session("sub@example.com").await;
    let hvac = app.fakes.store.seed_category("HVAC", "hvac", 1).await;
    app.fakes.store.seed_category("Plumbing", "plumbing", 2).await;

    let (status, body) = app
        .post(
            "/api/v1/onboarding/subcontractor",
            Some(&session.access_token),
            subcontractor(json!([
                { "category_id": "hvac", "description": "Furnaces" },
                { "category": "Plumbing" },
                { "categoryId": hvac.id.to_string() }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "subcontractor");
    assert_eq!(body["onboarding_status"], "completed");
    assert_eq!(body["locations_total"], 1);
    assert_eq!(body["services_total"], 3);

    let (status, _) = app
        .post(
            "/api/v1/onboarding/subcontractor",
            Some(&session.access_token),
            subcontractor(json!([])),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Um perfil por identidade, qualquer que seja o papel.
    let (status, _) = app
        .post("/api/v1/onboarding/owner", Some(&session.access_token), json!({ "role": "owner" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn property_manager_needs_a_pma_document() {
    let app = TestApp::new();
    let session = app.verified_session("pm@example.com").await;

    let (status, _) = app
        .post(
            "/api/v1/onboarding/owner",
            Some(&session.access_token),
            json!({ "role": "property_manager", "companyName": "PM Co" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, upload) = app
        .send(multipart_upload(&session.access_token, "file", "My PMA (final).pdf", b"%PDF-1.4 test"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", upload);
    let path = upload["path"].as_str().unwrap().to_string();
    assert!(path.starts_with(&format!("{}/", session.user_id)));
    assert!(path.ends_with("_My_PMA__final_.pdf"));
    assert_eq!(upload["doc_type"], "pma");
    assert!(upload["url"].as_str().unwrap().contains("expires_in=3600"));

    let (stored, content_type) = app.fakes.storage.object(&path).await.expect("objeto no storage");
    assert_eq!(stored, b"%PDF-1.4 test");
    assert_eq!(content_type, "application/pdf");

    let (status, body) = app
        .post(
            "/api/v1/onboarding/owner",
            Some(&session.access_token),
            json!({ "role": "property_manager", "pmaDocumentUrl": path }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["role"], "property_manager");
    assert_eq!(body["onboarding_status"], "completed");
}

#[tokio::test]
async fn owner_role_defaults_and_rejects_unknown_roles() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;

    let (status, _) = app
        .post("/api/v1/onboarding/owner", Some(&session.access_token), json!({ "role": "landlord" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/v1/onboarding/owner", Some(&session.access_token), json!({ "portfolioSize": 12 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "owner");
}

#[tokio::test]
async fn upload_rejects_missing_or_empty_files() {
    let app = TestApp::new();
    let session = app.verified_session("pm@example.com").await;

    let (status, _) = app
        .send(multipart_upload(&session.access_token, "file", "empty.pdf", b""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(multipart_upload(&session.access_token, "attachment", "doc.pdf", b"data"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signed_urls_default_to_one_hour() {
    let app = TestApp::new();
    let session = app.verified_session("pm@example.com").await;

    let (status, body) = app
        .get("/api/v1/onboarding/file/signed-url?path=abc/1_doc.pdf", &session.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 3600);

    let (_, body) = app
        .get("/api/v1/onboarding/file/signed-url?path=abc/1_doc.pdf&expires_in=60", &session.access_token)
        .await;
    assert_eq!(body["expires_in"], 60);

    let (status, _) = app
        .get("/api/v1/onboarding/file/signed-url?path=abc/1_doc.pdf&expires_in=0", &session.access_token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn service_category_catalog() {
    let app = TestApp::new();
    let session = app.verified_session("admin@example.com").await;
    app.fakes.store.seed_category("Plumbing", "plumbing", 2).await;

    let (status, created) = app
        .post(
            "/api/v1/onboarding/categories",
            Some(&session.access_token),
            json!({ "name": "Heating & Cooling" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "heating-cooling");

    let (status, _) = app
        .post(
            "/api/v1/onboarding/categories",
            Some(&session.access_token),
            json!({ "name": "Heating and cooling", "slug": "Heating Cooling" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/v1/onboarding/categories", Some(&session.access_token), json!({ "name": "&&&" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, listed) = app.get("/api/v1/onboarding/categories", &session.access_token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed.as_array().unwrap().iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Heating & Cooling", "Plumbing"]);
}
