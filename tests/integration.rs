use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use driver_hub::api::rest::router;
use driver_hub::state::AppState;

fn setup() -> axum::Router {
    // Low bcrypt cost keeps the auth tests fast.
    let state = AppState::new(1024, 4);
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register_driver(app: &axum::Router, email: &str, vehicle_type: &str) -> (String, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({
                "email": email,
                "password": "hunter2hunter2",
                "full_name": "Robin Rider",
                "phone_number": "555-0101",
                "vehicle_type": vehicle_type
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    (token, body["driver"].clone())
}

async fn create_order(app: &axum::Router, vehicle_type: &str, price: f64) -> Value {
    let address = json!({
        "address1": "100 Main St",
        "city": "Toronto",
        "province": "ON",
        "postal_code": "M5V 1A1",
        "country": "CA"
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/orders",
            None,
            json!({
                "vehicle_type": vehicle_type,
                "price": price,
                "shipping_item": "Groceries",
                "shipping_weight": 2.5,
                "duration_minutes": 30,
                "pickup_address": address,
                "delivery_address": address
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["orders"], 0);
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("ws_subscribers"));
}

#[tokio::test]
async fn register_creates_offline_driver_profile() {
    let app = setup();
    let (_token, driver) = register_driver(&app, "robin@example.com", "bicycle").await;

    assert_eq!(driver["email"], "robin@example.com");
    assert_eq!(driver["vehicle_type"], "bicycle");
    assert_eq!(driver["status"], "offline");
    assert!(driver["last_logged_in"].is_null());
    assert_eq!(driver["green_score"], 0);
    assert!(driver.get("password_hash").is_none());
}

#[tokio::test]
async fn login_brings_a_fresh_registration_online() {
    let app = setup();
    let (_token, driver) = register_driver(&app, "robin@example.com", "bicycle").await;
    assert_eq!(driver["status"], "offline");

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "robin@example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["driver"]["status"], "online");
    assert!(body["driver"]["last_logged_in"].is_string());
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let app = setup();
    register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({
                "email": "robin@example.com",
                "password": "hunter2hunter2",
                "full_name": "Other Robin",
                "phone_number": "555-0102",
                "vehicle_type": "car"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_accepts_right_one() {
    let app = setup();
    register_driver(&app, "robin@example.com", "bicycle").await;

    let bad = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "robin@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    let good = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "robin@example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(good.status(), StatusCode::OK);

    let body = body_json(good).await;
    assert!(body["token"].as_str().unwrap().len() > 0);
    assert_eq!(body["driver"]["status"], "online");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(get_request("/orders/available", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(get_request("/drivers/me", Some("not-a-real-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = setup();
    let (token, _driver) = register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/logout", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request("/drivers/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn available_orders_respect_vehicle_type() {
    let app = setup();
    let (bike_token, _) = register_driver(&app, "bike@example.com", "bicycle").await;
    let (car_token, _) = register_driver(&app, "car@example.com", "car").await;

    create_order(&app, "bicycle", 12.5).await;

    let response = app
        .clone()
        .oneshot(get_request("/orders/available", Some(&bike_token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(get_request("/orders/available", Some(&car_token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn accept_assigns_order_and_blocks_the_second_driver() {
    let app = setup();
    let (first_token, first_driver) = register_driver(&app, "first@example.com", "bicycle").await;
    let (second_token, _) = register_driver(&app, "second@example.com", "bicycle").await;

    let order = create_order(&app, "bicycle", 18.75).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/accept"),
            Some(&first_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["driver_id"], first_driver["uid"]);
    assert!(body["accepted_at"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/accept"),
            Some(&second_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The race loser just sees the order gone from their available list.
    let response = app
        .oneshot(get_request("/orders/available", Some(&second_token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn decline_requires_a_reason() {
    let app = setup();
    let (token, _) = register_driver(&app, "robin@example.com", "bicycle").await;
    let order = create_order(&app, "bicycle", 10.0).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/decline"),
            Some(&token),
            json!({ "details": "too far" }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = app
        .oneshot(get_request(&format!("/orders/{order_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["decline_count"], 0);
}

#[tokio::test]
async fn declined_order_leaves_the_drivers_available_list() {
    let app = setup();
    let (token, driver) = register_driver(&app, "robin@example.com", "bicycle").await;
    let order = create_order(&app, "bicycle", 10.0).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/accept"),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/decline"),
            Some(&token),
            json!({ "reason": "DISTANCE", "details": "outside my zone" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert!(body["driver_id"].is_null());
    assert_eq!(body["decline_count"], 1);
    assert!(body["declined_drivers"]
        .as_array()
        .unwrap()
        .contains(&driver["uid"]));

    // Still pending, but never re-offered to the driver who declined it.
    let response = app
        .oneshot(get_request("/orders/available", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn pickup_on_a_pending_order_is_rejected_without_changes() {
    let app = setup();
    let (token, _) = register_driver(&app, "robin@example.com", "bicycle").await;
    let order = create_order(&app, "bicycle", 10.0).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/pickup"),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    let response = app
        .oneshot(get_request(&format!("/orders/{order_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert!(body["picked_up_at"].is_null());
}

#[tokio::test]
async fn full_delivery_flow_records_one_earnings_entry() {
    let app = setup();
    let (token, _) = register_driver(&app, "robin@example.com", "bicycle").await;
    let order = create_order(&app, "bicycle", 22.40).await;
    let order_id = order["id"].as_str().unwrap();

    for step in ["accept", "pickup", "transit", "complete"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/orders/{order_id}/{step}"),
                Some(&token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "step {step} failed");
    }

    let response = app
        .clone()
        .oneshot(get_request(&format!("/orders/{order_id}"), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
    assert!(body["completed_at"].is_string());

    let response = app
        .clone()
        .oneshot(get_request("/earnings", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["order_id"].as_str().unwrap(), order_id);
    assert_eq!(entries[0]["amount"], 22.40);
    assert_eq!(body["total"], 22.40);

    let response = app
        .clone()
        .oneshot(get_request("/drivers/me/stats", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["completed_deliveries"], 1);
    assert_eq!(body["total_earnings"], 22.40);

    let response = app.oneshot(get_request("/metrics", None)).await.unwrap();
    let body = body_string(response).await;
    assert!(body.contains("order_transition_latency_seconds"));
    assert!(body.contains("order_transitions_total"));
}

#[tokio::test]
async fn only_the_assigned_driver_can_progress_an_order() {
    let app = setup();
    let (owner_token, _) = register_driver(&app, "owner@example.com", "bicycle").await;
    let (other_token, _) = register_driver(&app, "other@example.com", "bicycle").await;

    let order = create_order(&app, "bicycle", 15.0).await;
    let order_id = order["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/accept"),
            Some(&owner_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/orders/{order_id}/pickup"),
            Some(&other_token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_update_changes_vehicle_and_documents() {
    let app = setup();
    let (token, _) = register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/drivers/me",
            Some(&token),
            json!({
                "vehicle_type": "van",
                "license_url": "https://files.example.com/license.pdf"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["vehicle_type"], "van");
    assert_eq!(body["license_url"], "https://files.example.com/license.pdf");

    // The classifier follows the new capability immediately.
    create_order(&app, "van", 30.0).await;
    let response = app
        .oneshot(get_request("/orders/available", Some(&token)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn incident_report_is_stored_as_pending() {
    let app = setup();
    let (token, driver) = register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/incidents",
            Some(&token),
            json!({
                "kind": "accident",
                "description": "minor collision at the intersection",
                "location": "King St & Bay St"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["driver_id"], driver["uid"]);
    assert!(body["reported_at"].is_string());
}

#[tokio::test]
async fn emergency_alert_captures_driver_name_and_location() {
    let app = setup();
    let (token, driver) = register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/emergencies",
            Some(&token),
            json!({ "location": { "latitude": 43.6532, "longitude": -79.3832 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["driver_id"], driver["uid"]);
    assert_eq!(body["driver_name"], "Robin Rider");
    assert_eq!(body["location"]["latitude"], 43.6532);
}

#[tokio::test]
async fn empty_incident_fields_are_rejected() {
    let app = setup();
    let (token, _) = register_driver(&app, "robin@example.com", "bicycle").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/incidents",
            Some(&token),
            json!({ "kind": "", "description": "something", "location": "here" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
