// tests/tenant_isolation.rs

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn foreign_resources_are_indistinguishable_from_missing_ones() {
    let app = TestApp::new();
    let alice = app.verified_session("alice@example.com").await;
    let bob = app.verified_session("bob@example.com").await;
    assert_ne!(alice.company_id, bob.company_id);

    let property = app.create_property(&alice.access_token, "Maple Court").await;
    let uri = format!("/api/v1/properties/{}", property);

    let (status, _) = app.get(&uri, &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&uri, &bob.access_token, json!({ "name": "Stolen" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&uri, &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("{}/units", uri), &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app.get("/api/v1/properties", &bob.access_token).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);

    // Continua intacta para a dona.
    let (status, body) = app.get(&uri, &alice.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Maple Court");
}

#[tokio::test]
async fn cross_company_references_are_rejected() {
    let app = TestApp::new();
    let alice = app.verified_session("alice@example.com").await;
    let bob = app.verified_session("bob@example.com").await;
    let alice_property = app.create_property(&alice.access_token, "Maple Court").await;

    // Técnico de Bob apontando para a propriedade de Alice
    let (status, _) = app
        .post(
            "/api/v1/technicians",
            Some(&bob.access_token),
            json!({ "first_name": "Tom", "last_name": "Fixer", "default_property_id": alice_property.to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Ordem de serviço de Bob na propriedade de Alice
    let (status, _) = app
        .post(
            "/api/v1/work-orders",
            Some(&bob.access_token),
            json!({ "property_id": alice_property.to_string(), "issue": "Leaking sink" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Técnico de Alice atribuído a uma ordem de Bob
    let (_, alice_tech) = app
        .post(
            "/api/v1/technicians",
            Some(&alice.access_token),
            json!({ "first_name": "Ann", "last_name": "Able" }),
        )
        .await;
    let bob_property = app.create_property(&bob.access_token, "Oak Tower").await;
    let (status, _) = app
        .post(
            "/api/v1/work-orders",
            Some(&bob.access_token),
            json!({
                "property_id": bob_property.to_string(),
                "issue": "Broken heater",
                "assigned_technician_id": alice_tech["id"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn technicians_and_work_orders_are_scoped_too() {
    let app = TestApp::new();
    let alice = app.verified_session("alice@example.com").await;
    let bob = app.verified_session("bob@example.com").await;

    let (status, tech) = app
        .post(
            "/api/v1/technicians",
            Some(&alice.access_token),
            json!({ "firstName": "Tom", "lastName": "Fixer" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tech_uri = format!("/api/v1/technicians/{}", tech["id"].as_str().unwrap());

    let (status, _) = app.get(&tech_uri, &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&tech_uri, &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let property = app.create_property(&alice.access_token, "Maple Court").await;
    let (_, order) = app
        .post(
            "/api/v1/work-orders",
            Some(&alice.access_token),
            json!({ "property_id": property.to_string(), "issue": "Leaking sink" }),
        )
        .await;
    let order_uri = format!("/api/v1/work-orders/{}", order["id"].as_str().unwrap());

    let (status, _) = app.get(&order_uri, &bob.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&order_uri, &bob.access_token, json!({ "status": "closed" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.get("/api/v1/work-orders", &bob.access_token).await;
    assert_eq!(page["total"], 0);
}
