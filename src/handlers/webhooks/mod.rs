pub mod paypal;

pub use paypal::handle_paypal_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/paypal", post(handle_paypal_webhook))
}
