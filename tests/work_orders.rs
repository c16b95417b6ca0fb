// tests/work_orders.rs

mod common;

use axum::http::StatusCode;
use common::{uuid_at, TestApp};
use serde_json::json;

#[tokio::test]
async fn free_text_unit_labels_are_idempotent_per_property() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    let mut unit_ids = Vec::new();
    for issue in ["Leaking sink", "Broken window"] {
        let (status, body) = app
            .post(
                "/api/v1/work-orders",
                Some(&session.access_token),
                json!({ "propertyId": property.to_string(), "unitLabel": " 2B ", "issue": issue }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["unit_label"], "2B");
        assert_eq!(body["property_name"], "Maple Court");
        assert_eq!(body["priority"], "routine");
        assert_eq!(body["status"], "open");
        unit_ids.push(uuid_at(&body, "unit_id"));
    }

    assert_eq!(unit_ids[0], unit_ids[1]);
    assert_eq!(app.fakes.store.unit_count(property).await, 1);
}

#[tokio::test]
async fn unit_id_must_belong_to_the_property() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let maple = app.create_property(&session.access_token, "Maple Court").await;
    let oak = app.create_property(&session.access_token, "Oak Tower").await;

    let (status, unit) = app
        .post(
            &format!("/api/v1/properties/{}/units", oak),
            Some(&session.access_token),
            json!({ "label": "101" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": maple.to_string(), "unit_id": unit["id"], "issue": "No heat" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": oak.to_string(), "unit_id": unit["id"], "issue": "No heat" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["unit_label"], "101");
}

#[tokio::test]
async fn priority_is_normalized_and_validated() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    let (status, body) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "Gas smell", "priority": "EMERGENCY" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority"], "emergency");

    let (status, _) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "Gas smell", "priority": "urgent" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "ab" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn issue_length_is_measured_after_trimming() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    let (status, body) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "   ab   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["issue"].is_array());

    let (status, order) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "  Leak  " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["issue"], "Leak");

    let uri = format!("/api/v1/work-orders/{}", order["id"].as_str().unwrap());
    let (status, body) = app.put(&uri, &session.access_token, json!({ "issue": "  ab " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["issue"].is_array());

    let (status, body) = app.put(&uri, &session.access_token, json!({ "issue": " Drip " })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"], "Drip");
}

#[tokio::test]
async fn listing_is_paginated_newest_first_and_filterable() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    for (issue, priority) in [("First issue", "routine"), ("Second issue", "emergency"), ("Third issue", "routine")] {
        let (status, _) = app
            .post(
                "/api/v1/work-orders",
                Some(&session.access_token),
                json!({ "property_id": property.to_string(), "issue": issue, "priority": priority }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = app.get("/api/v1/work-orders?limit=2", &session.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["offset"], 0);
    let orders = page["work_orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["issue"], "Third issue");

    let (_, page) = app.get("/api/v1/work-orders?limit=2&offset=2", &session.access_token).await;
    assert_eq!(page["work_orders"][0]["issue"], "First issue");

    let (_, page) = app.get("/api/v1/work-orders?priority=emergency", &session.access_token).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["work_orders"][0]["issue"], "Second issue");

    let (status, _) = app.get("/api/v1/work-orders?limit=0", &session.access_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_assigns_and_unassigns_technicians() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    let (_, tech) = app
        .post(
            "/api/v1/technicians",
            Some(&session.access_token),
            json!({ "first_name": "Tom", "last_name": "Fixer" }),
        )
        .await;
    let (_, order) = app
        .post(
            "/api/v1/work-orders",
            Some(&session.access_token),
            json!({ "property_id": property.to_string(), "issue": "Leaking sink" }),
        )
        .await;
    let uri = format!("/api/v1/work-orders/{}", order["id"].as_str().unwrap());

    let (status, body) = app
        .put(&uri, &session.access_token, json!({ "assignedTechnicianId": tech["id"], "status": "assigned" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigned_technician_id"], tech["id"]);
    assert_eq!(body["status"], "assigned");

    let (status, body) = app.put(&uri, &session.access_token, json!({ "assigned_technician_id": "" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["assigned_technician_id"].is_null());

    let (status, _) = app.put(&uri, &session.access_token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn options_group_units_under_their_property() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let maple = app.create_property(&session.access_token, "Maple Court").await;
    app.create_property(&session.access_token, "Oak Tower").await;

    for label in ["3C", "1A"] {
        let (status, _) = app
            .post(
                &format!("/api/v1/properties/{}/units", maple),
                Some(&session.access_token),
                json!({ "label": label }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/v1/work-orders/options", &session.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["company_id"], session.company_id.to_string());

    let properties = body["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0]["name"], "Maple Court");
    assert_eq!(properties[0]["units"][0]["label"], "1A");
    assert_eq!(properties[0]["units"][1]["label"], "3C");
    assert_eq!(properties[1]["units"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn property_and_unit_crud() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;
    let uri = format!("/api/v1/properties/{}", property);

    let (status, _) = app.put(&uri, &session.access_token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app.put(&uri, &session.access_token, json!({ "notes": "new roof" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "new roof");
    assert_eq!(body["name"], "Maple Court");

    let units_uri = format!("{}/units", uri);
    let (_, unit) = app.post(&units_uri, Some(&session.access_token), json!({ "label": "1A" })).await;
    let (status, _) = app.post(&units_uri, Some(&session.access_token), json!({ "label": "1A" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let unit_uri = format!("/api/v1/units/{}", unit["id"].as_str().unwrap());
    let (status, body) = app.put(&unit_uri, &session.access_token, json!({ "isActive": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, _) = app.delete(&unit_uri, &session.access_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&uri, &session.access_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, &session.access_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn technician_defaults_and_placeholder_property() {
    let app = TestApp::new();
    let session = app.verified_session("owner@example.com").await;
    let property = app.create_property(&session.access_token, "Maple Court").await;

    let (status, tech) = app
        .post(
            "/api/v1/technicians",
            Some(&session.access_token),
            json!({
                "first_name": "Tom",
                "last_name": "Fixer",
                "user_id": "string",
                "default_property_id": property.to_string()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", tech);
    assert_eq!(tech["merit_percent"], 100);
    assert_eq!(tech["availability"], "available");
    assert!(tech["user_id"].is_null());
    assert_eq!(tech["default_property_name"], "Maple Court");

    let uri = format!("/api/v1/technicians/{}", tech["id"].as_str().unwrap());
    let (status, body) = app.put(&uri, &session.access_token, json!({ "default_property_id": "none" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["default_property_id"].is_null());
    assert!(body["default_property_name"].is_null());

    let (status, _) = app
        .post(
            "/api/v1/technicians",
            Some(&session.access_token),
            json!({ "first_name": "Ann", "last_name": "Able", "user_id": "not-a-uuid" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
