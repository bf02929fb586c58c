mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_booking_marks_seat_pending() {
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/api/v1/bookings", None, json!({
        "table": 5,
        "seat": 3,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "phone": "+4917612345678",
        "email": "ada@example.com",
    })).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "SELECTED");
    assert_eq!(body["seat_table"], 5);
    assert_eq!(body["seat_number"], 3);
    assert!(body["ticket_id"].is_null());

    let (status, seats) = app.get("/api/v1/seats", None).await;
    assert_eq!(status, StatusCode::OK);
    let entry = seats["seats"].as_array().unwrap().iter()
        .find(|e| e["seat"] == "5-3")
        .unwrap();
    assert_eq!(entry["status"], "pending");
}

#[tokio::test]
async fn duplicate_seat_is_rejected() {
    let app = TestApp::new().await;
    app.create_booking(2, 7, "+4917612345678").await;

    let (status, body) = app.post_json("/api/v1/bookings", None, json!({
        "table": 2,
        "seat": 7,
        "first_name": "Second",
        "last_name": "Guest",
        "phone": "+4917687654321",
    })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("2-7"));
}

#[tokio::test]
async fn concurrent_bookings_only_one_wins() {
    let app = TestApp::new().await;

    let payload = |phone: &str| json!({
        "table": 10,
        "seat": 10,
        "first_name": "Race",
        "last_name": "Runner",
        "phone": phone,
    });

    let (a, b) = tokio::join!(
        app.post_json("/api/v1/bookings", None, payload("+4917611111111")),
        app.post_json("/api/v1/bookings", None, payload("+4917622222222")),
    );

    let statuses = [a.0, b.0];
    assert!(statuses.contains(&StatusCode::CREATED));
    assert!(statuses.contains(&StatusCode::CONFLICT));
}

#[tokio::test]
async fn invalid_phone_is_unprocessable() {
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/api/v1/bookings", None, json!({
        "table": 1,
        "seat": 1,
        "first_name": "Bad",
        "last_name": "Phone",
        "phone": "017612345678",
    })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn out_of_range_seat_is_rejected() {
    let app = TestApp::new().await;

    for (table, seat) in [(0, 1), (37, 1), (1, 0), (1, 15)] {
        let (status, _) = app.post_json("/api/v1/bookings", None, json!({
            "table": table,
            "seat": seat,
            "first_name": "Out",
            "last_name": "OfRange",
            "phone": "+4917612345678",
        })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "table {} seat {}", table, seat);
    }
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.post_json("/api/v1/bookings", None, json!({
        "table": 1,
        "seat": 1,
        "first_name": "   ",
        "last_name": "Guest",
        "phone": "+4917612345678",
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_payment_is_idempotent() {
    let app = TestApp::new().await;
    let id = app.create_booking(3, 4, "+4917612345678").await;

    let (status, body) = app.post_json(&format!("/api/v1/bookings/{}/report-payment", id), None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    // Second report is a no-op, not a conflict.
    let (status, body) = app.post_json(&format!("/api/v1/bookings/{}/report-payment", id), None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
}

#[tokio::test]
async fn report_payment_unknown_booking() {
    let app = TestApp::new().await;
    let (status, _) = app.post_json("/api/v1/bookings/no-such-id/report-payment", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ticket_lookup_before_payment_is_404() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/v1/tickets/TKT-NOPE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_floor_has_all_seats_available() {
    let app = TestApp::new().await;
    let (status, seats) = app.get("/api/v1/seats", None).await;
    assert_eq!(status, StatusCode::OK);

    let entries = seats["seats"].as_array().unwrap();
    assert_eq!(entries.len(), 36 * 14);
    assert!(entries.iter().all(|e| e["status"] == "available"));
}
