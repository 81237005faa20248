//! Tests for the POST /webhook/paypal endpoint.
//!
//! The gateway must always get a 2xx back for business conditions -
//! anything else makes PayPal retry the notification forever.

use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;
use common::*;

fn webhook_app(state: AppState) -> Router {
    darkroom::handlers::webhooks::router().with_state(state)
}

fn form_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/paypal")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_with_no_data_returns_ok_and_persists() {
    let state = create_test_app_state();
    let app = webhook_app(state.clone());

    let response = app
        .oneshot(form_request("txn_id=test&payment_status=Completed".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_notifications(&conn).unwrap(), 1);
}

#[tokio::test]
async fn test_webhook_completed_payment_marks_order_paid() {
    let state = create_test_app_state();

    let (order, invoice) = {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "testuser", false);
        let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);
        let record =
            darkroom::payments::invoice::allocate_transaction(&conn, &order).unwrap();
        (order, record.invoice_id.unwrap())
    };

    let app = webhook_app(state.clone());
    let body = format!(
        "txn_id=test_txn_id&payment_status=Completed&custom={}&invoice={}&receiver_email={}",
        order.id,
        invoice,
        TEST_RECEIVER_EMAIL.replace('@', "%40")
    );

    let response = app.oneshot(form_request(body)).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&response_body[..], b"OK");

    let conn = state.db.get().unwrap();
    assert!(queries::get_order(&conn, order.id).unwrap().unwrap().paid);
    assert_eq!(queries::count_notifications(&conn).unwrap(), 1);
}

#[tokio::test]
async fn test_webhook_unresolvable_notification_still_returns_ok() {
    let state = create_test_app_state();
    let app = webhook_app(state.clone());

    // custom names an order that does not exist
    let response = app
        .oneshot(form_request(
            "txn_id=test&payment_status=Completed&custom=1".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_notifications(&conn).unwrap(), 1);
    // No order was created or mutated along the way
    assert!(queries::list_orders(&conn).unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_flagged_notification_returns_ok_without_mutation() {
    let state = create_test_app_state();

    let order = {
        let conn = state.db.get().unwrap();
        let user = create_test_user(&conn, "testuser", false);
        let order = create_test_order(&conn, user.id, TEST_RECEIVER_EMAIL);
        darkroom::payments::invoice::allocate_transaction(&conn, &order).unwrap();
        order
    };

    let app = webhook_app(state.clone());
    let body = format!(
        "txn_id=test_txn_id&payment_status=Completed&custom={}&flag=true&flag_info=Duplicate+txn_id.+(test_txn_id)",
        order.id
    );

    let response = app.oneshot(form_request(body)).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let conn = state.db.get().unwrap();
    // Flagged notifications never complete a payment
    assert!(!queries::get_order(&conn, order.id).unwrap().unwrap().paid);
    let stored = queries::list_activity(&conn).unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_admin_surface_rejects_anonymous_and_non_staff() {
    let state = create_test_app_state();

    let customer_key = {
        let conn = state.db.get().unwrap();
        let customer = create_test_user(&conn, "customer", false);
        let key = queries::generate_api_key();
        queries::set_user_api_key(&conn, customer.id, &key).unwrap();
        key
    };

    let app = darkroom::handlers::admin::router(state.clone()).with_state(state.clone());

    // No credentials at all
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/gallery/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);

    // Valid key, but not staff
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/admin/gallery/categories")
                .header("Authorization", format!("Bearer {}", customer_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}
