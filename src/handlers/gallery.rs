//! Public, read-only gallery views.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{Category, Image};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    /// Category id to filter by; absent means the whole gallery
    pub category: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    /// "All" or the selected category's name
    pub cat_selection: String,
    pub categories: Vec<Category>,
    pub images: Vec<Image>,
    pub total_image_count: i64,
}

/// GET /gallery - all categories plus the images of the selected one
/// (or every image when no category is selected).
pub async fn view_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>> {
    let conn = state.db.get()?;
    let categories = queries::list_categories(&conn)?;

    let (cat_selection, images) = match query.category {
        None => ("All".to_string(), queries::list_all_images(&conn)?),
        Some(id) => {
            let category = queries::get_category(&conn, id)?
                .ok_or_else(|| AppError::NotFound(format!("No category with id {}", id)))?;
            let images = queries::list_images_for_category(&conn, id)?;
            (category.name, images)
        }
    };

    Ok(Json(GalleryResponse {
        cat_selection,
        categories,
        images,
        total_image_count: queries::count_images(&conn)?,
    }))
}

/// GET /gallery/albums - the album menu.
pub async fn gallery_menu(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_categories(&conn)?))
}

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub images: Vec<Image>,
}

/// GET /gallery/album/{slug} - one album and its images.
pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    let conn = state.db.get()?;
    let category = queries::get_category_by_slug(&conn, &slug)?
        .ok_or_else(|| AppError::NotFound(format!("No category with slug {}", slug)))?;
    let images = queries::list_images_for_category(&conn, category.id)?;
    Ok(Json(CategoryDetail { category, images }))
}

/// GET /media/{filename} - serve a stored gallery file.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = state.media.read(&filename)?;
    let content_type = match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/gallery", get(view_gallery))
        .route("/gallery/albums", get(gallery_menu))
        .route("/gallery/album/{slug}", get(category_detail))
        .route("/media/{filename}", get(serve_media))
}
