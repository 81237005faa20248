mod categories;
mod orders;

pub use categories::*;
pub use orders::*;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::db::AppState;
use crate::middleware::staff_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // Gallery management
        .route("/admin/gallery/categories", get(list_categories))
        .route("/admin/gallery/categories", post(batch_edit_categories))
        .route("/admin/gallery/categories/{id}", get(category_detail))
        .route("/admin/gallery/categories/{id}/images", post(upload_image))
        .route("/admin/gallery/images/{id}/file", put(replace_image_file))
        .route("/admin/gallery/images/{id}", patch(update_image))
        .route("/admin/gallery/images/{id}", delete(delete_image))
        // Order / transaction bookkeeping
        .route("/admin/orders", post(create_order))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}/invoice", post(prepare_invoice))
        .route("/admin/transactions", get(list_transactions))
        .layer(middleware::from_fn_with_state(state, staff_auth))
}
