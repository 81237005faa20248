//! The PayPal IPN intake.
//!
//! The upstream gateway integration has already verified the postback and
//! set `flag`/`flag_info` accordingly; this handler persists the
//! notification, runs reconciliation, and dispatches the resulting emails
//! in the background. Business conditions never surface here - the gateway
//! always gets a 200 so it stops retrying.

use axum::{extract::State, http::StatusCode, Form};

use crate::db::{queries, AppState};
use crate::email;
use crate::models::CreateNotification;
use crate::payments::reconcile;

/// Result type for webhook operations.
pub type WebhookResult = (StatusCode, &'static str);

/// POST /webhook/paypal
pub async fn handle_paypal_webhook(
    State(state): State<AppState>,
    Form(payload): Form<CreateNotification>,
) -> WebhookResult {
    let conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    let ipn = match queries::create_notification(&conn, &payload) {
        Ok(ipn) => ipn,
        Err(e) => {
            tracing::error!("Failed to persist payment notification: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    };

    tracing::info!(
        notification_id = ipn.id,
        txn_id = %ipn.txn_id,
        status = %ipn.payment_status,
        flagged = ipn.flag,
        "PayPal notification received"
    );

    let emails = if ipn.flag {
        reconcile::process_invalid_notification(&conn, &ipn, &state.notify)
    } else {
        reconcile::process_notification(&conn, &ipn, &state.notify)
    };

    email::spawn_send_all(state.mailer.clone(), emails);

    (StatusCode::OK, "OK")
}
