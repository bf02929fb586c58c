mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use sqlx::Row;

async fn job_rows(app: &TestApp, booking_id: &str) -> Vec<(String, String)> {
    sqlx::query("SELECT job_type, status FROM jobs WHERE json_extract(payload, '$.booking_id') = ?")
        .bind(booking_id)
        .fetch_all(&app.pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.get::<String, _>("job_type"), r.get::<String, _>("status")))
        .collect()
}

#[tokio::test]
async fn confirm_payment_assigns_ticket_and_enqueues_one_job() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(5, 3, "+4917612345678").await;

    let (status, body) = app.post_json(
        &format!("/api/v1/admin/bookings/{}/confirm-payment", id),
        Some(&token),
        json!({}),
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_confirmed"], false);
    let ticket_id = body["ticket_id"].as_str().unwrap().to_string();
    assert!(ticket_id.starts_with("TKT-"));

    let jobs = job_rows(&app, &id).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0], ("TICKET_DELIVERY".to_string(), "PENDING".to_string()));

    // Verification lookup works once paid.
    let (status, ticket) = app.get(&format!("/api/v1/tickets/{}", ticket_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["seat"], "5-3");
    assert_eq!(ticket["status"], "PAID");
}

#[tokio::test]
async fn confirm_payment_is_idempotent() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(6, 1, "+4917612345678").await;

    let uri = format!("/api/v1/admin/bookings/{}/confirm-payment", id);
    let (_, first) = app.post_json(&uri, Some(&token), json!({})).await;
    let (status, second) = app.post_json(&uri, Some(&token), json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["already_confirmed"], true);
    assert_eq!(second["ticket_id"], first["ticket_id"]);

    // Still exactly one delivery job.
    assert_eq!(job_rows(&app, &id).await.len(), 1);
}

#[tokio::test]
async fn confirm_payment_works_from_pending_too() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(6, 2, "+4917612345678").await;

    app.post_json(&format!("/api/v1/bookings/{}/report-payment", id), None, json!({})).await;

    let (status, body) = app.post_json(
        &format!("/api/v1/admin/bookings/{}/confirm-payment", id),
        Some(&token),
        json!({}),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_confirmed"], false);
}

#[tokio::test]
async fn admin_routes_require_valid_token() {
    let app = TestApp::new().await;
    let id = app.create_booking(7, 7, "+4917612345678").await;
    let uri = format!("/api/v1/admin/bookings/{}/confirm-payment", id);

    let (status, _) = app.post_json(&uri, None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post_json(&uri, Some("not-a-real-token"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, _) = app.post_json("/api/v1/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/v1/admin/bookings", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app.post_json("/api/v1/auth/login", None, json!({
        "username": common::ADMIN_USERNAME,
        "password": "wrong",
    })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_paid_booking_reports_was_paid_and_frees_seat() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(8, 8, "+4917612345678").await;
    app.post_json(&format!("/api/v1/admin/bookings/{}/confirm-payment", id), Some(&token), json!({})).await;

    let (status, body) = app.request("DELETE", &format!("/api/v1/admin/bookings/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_paid"], true);

    // Pending delivery job is cancelled along with the booking.
    let jobs = job_rows(&app, &id).await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].1, "CANCELLED");

    // The seat is bookable again; the cancelled row never resurrects.
    let new_id = app.create_booking(8, 8, "+4917687654321").await;
    assert_ne!(new_id, id);

    let (status, body) = app.request("DELETE", &format!("/api/v1/admin/bookings/{}", new_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["was_paid"], false);
}

#[tokio::test]
async fn delete_is_not_repeatable() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(9, 9, "+4917612345678").await;

    let uri = format!("/api/v1/admin/bookings/{}", id);
    let (status, _) = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_bookings_filters_by_status_and_limit() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let a = app.create_booking(1, 1, "+4917611111111").await;
    app.create_booking(1, 2, "+4917622222222").await;
    app.create_booking(1, 3, "+4917633333333").await;
    app.post_json(&format!("/api/v1/admin/bookings/{}/confirm-payment", a), Some(&token), json!({})).await;

    let (status, body) = app.get("/api/v1/admin/bookings?status=PAID", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"].as_str().unwrap(), a);

    let (status, body) = app.get("/api/v1/admin/bookings?limit=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/v1/admin/bookings?status=NONSENSE", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resend_ticket_enqueues_a_fresh_job() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.create_booking(4, 4, "+4917612345678").await;

    // Not paid yet: resend refused.
    let (status, _) = app.post_json(&format!("/api/v1/admin/bookings/{}/resend-ticket", id), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post_json(&format!("/api/v1/admin/bookings/{}/confirm-payment", id), Some(&token), json!({})).await;
    let (status, _) = app.post_json(&format!("/api/v1/admin/bookings/{}/resend-ticket", id), Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(job_rows(&app, &id).await.len(), 2);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
