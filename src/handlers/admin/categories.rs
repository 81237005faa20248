//! Staff gallery management: batch category editing and per-category
//! image operations.
//!
//! The batch endpoint reports its changes in the same phrasing the studio
//! saw on the old site ("Category 'x' and all associated images have been
//! deleted", ...), and every change lands in the activity log with the
//! acting staff user.

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::middleware::StaffContext;
use crate::models::{
    CategoryBatch, CategoryBatchResult, CategoryWithCount, Image, UpdateImage, UploadParams,
};
use crate::util::unique_slug;

/// GET /admin/gallery/categories - categories with image counts.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithCount>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_categories_with_counts(&conn)?))
}

/// GET /admin/gallery/categories/{id} - one category and its images.
pub async fn category_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<crate::handlers::gallery::CategoryDetail>> {
    let conn = state.db.get()?;
    let category = queries::get_category(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("No category with id {}", id)))?;
    let images = queries::list_images_for_category(&conn, id)?;
    Ok(Json(crate::handlers::gallery::CategoryDetail {
        category,
        images,
    }))
}

/// POST /admin/gallery/categories - apply a batch of category operations
/// (create / rename / redescribe / delete) and report what changed.
pub async fn batch_edit_categories(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Json(batch): Json<CategoryBatch>,
) -> Result<Json<CategoryBatchResult>> {
    let conn = state.db.get()?;

    let mut deleted: Vec<String> = Vec::new();
    let mut renamed: Vec<(String, String)> = Vec::new();
    let mut created: Vec<String> = Vec::new();
    let mut described: Vec<String> = Vec::new();

    for op in &batch.categories {
        match op.id {
            Some(id) if op.delete => {
                let category = queries::get_category(&conn, id)?
                    .ok_or_else(|| AppError::NotFound(format!("No category with id {}", id)))?;
                // Files first; the rows cascade with the category
                for image in queries::list_images_for_category(&conn, id)? {
                    state.media.delete(&image.filename)?;
                }
                queries::delete_category(&conn, id)?;
                deleted.push(category.name);
            }
            Some(id) => {
                let existing = queries::get_category(&conn, id)?
                    .ok_or_else(|| AppError::NotFound(format!("No category with id {}", id)))?;

                let new_name = op
                    .name
                    .as_deref()
                    .filter(|name| *name != existing.name);
                let new_description = op
                    .description
                    .as_deref()
                    .filter(|desc| Some(*desc) != existing.description.as_deref());

                let slug;
                let name_and_slug = match new_name {
                    Some(name) => {
                        slug = unique_slug(&conn, name)?;
                        renamed.push((existing.name.clone(), name.to_string()));
                        Some((name, slug.as_str()))
                    }
                    None => None,
                };
                if new_description.is_some() && new_name.is_none() {
                    described.push(format!(
                        "Category {}'s description has been updated",
                        existing.name
                    ));
                }

                queries::update_category(&conn, id, name_and_slug, new_description)?;
            }
            None => {
                let Some(name) = op.name.as_deref().filter(|n| !n.trim().is_empty()) else {
                    return Err(AppError::BadRequest(
                        "New categories need a name".into(),
                    ));
                };
                let slug = unique_slug(&conn, name)?;
                queries::create_category(&conn, name, op.description.as_deref(), &slug)?;
                created.push(name.to_string());
            }
        }
    }

    let mut messages = Vec::new();

    match deleted.len() {
        0 => {}
        1 => messages.push(format!(
            "Category '{}' and all associated images have been deleted",
            deleted[0]
        )),
        _ => messages.push(format!(
            "Categories {} and all associated images have been deleted",
            quote_join(&deleted)
        )),
    }
    if !renamed.is_empty() {
        messages.push(format!(
            "Category names changed: {}",
            renamed
                .iter()
                .map(|(old, new)| format!("'{}' changed to '{}'", old, new))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    messages.extend(described);
    match created.len() {
        0 => {}
        1 => messages.push(format!("Category '{}' has been created", created[0])),
        _ => messages.push(format!("Categories {} have been created", quote_join(&created))),
    }

    if messages.is_empty() {
        messages.push("No changes made".to_string());
    } else {
        for msg in &messages {
            queries::log_activity(
                &conn,
                &format!("{} by admin user {}", msg, ctx.user.username),
            )?;
        }
    }

    Ok(Json(CategoryBatchResult { messages }))
}

/// POST /admin/gallery/categories/{id}/images - store an uploaded file
/// (raw request body) and create its image record.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(category_id): Path<i64>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<Image>)> {
    let conn = state.db.get()?;
    let category = queries::get_category(&conn, category_id)?
        .ok_or_else(|| AppError::NotFound(format!("No category with id {}", category_id)))?;

    let filename = state.media.save(&params.filename, &body)?;
    let image = queries::create_image(&conn, category_id, &filename, params.caption.as_deref())?;

    queries::log_activity(
        &conn,
        &format!(
            "Pictures added to Gallery category {} by admin user {}: {}",
            category.name, ctx.user.username, filename
        ),
    )?;

    Ok((StatusCode::CREATED, Json(image)))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceParams {
    pub filename: String,
}

/// PUT /admin/gallery/images/{id}/file - replace the stored file; the
/// superseded file is removed from disk.
pub async fn replace_image_file(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Query(params): Query<ReplaceParams>,
    body: Bytes,
) -> Result<Json<Image>> {
    let conn = state.db.get()?;
    let image = queries::get_image(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("No image with id {}", id)))?;
    let category = queries::get_category(&conn, image.category_id)?
        .ok_or_else(|| AppError::Internal("Image without category".into()))?;

    // New file in place before the old one goes
    let new_filename = state.media.save(&params.filename, &body)?;
    queries::update_image_filename(&conn, id, &new_filename)?;
    state.media.delete(&image.filename)?;

    queries::log_activity(
        &conn,
        &format!(
            "Pictures in Gallery category {} edited by admin user {}: {}",
            category.name, ctx.user.username, new_filename
        ),
    )?;

    let updated = queries::get_image(&conn, id)?
        .ok_or_else(|| AppError::Internal("Image vanished during replace".into()))?;
    Ok(Json(updated))
}

/// PATCH /admin/gallery/images/{id} - update the caption.
pub async fn update_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateImage>,
) -> Result<Json<Image>> {
    let conn = state.db.get()?;
    let image = queries::get_image(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("No image with id {}", id)))?;
    let category = queries::get_category(&conn, image.category_id)?
        .ok_or_else(|| AppError::Internal("Image without category".into()))?;

    queries::update_image_caption(&conn, id, input.caption.as_deref())?;

    queries::log_activity(
        &conn,
        &format!(
            "Pictures in Gallery category {} edited by admin user {}: {}",
            category.name, ctx.user.username, image.filename
        ),
    )?;

    let updated = queries::get_image(&conn, id)?
        .ok_or_else(|| AppError::Internal("Image vanished during update".into()))?;
    Ok(Json(updated))
}

/// DELETE /admin/gallery/images/{id} - remove record and file.
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<StaffContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    let image = queries::get_image(&conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("No image with id {}", id)))?;
    let category = queries::get_category(&conn, image.category_id)?
        .ok_or_else(|| AppError::Internal("Image without category".into()))?;

    queries::delete_image(&conn, id)?;
    state.media.delete(&image.filename)?;

    queries::log_activity(
        &conn,
        &format!(
            "Pictures deleted from Gallery category {} by admin user {}: {}",
            category.name, ctx.user.username, image.filename
        ),
    )?;

    Ok(StatusCode::NO_CONTENT)
}

fn quote_join(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{}'", name))
        .collect::<Vec<_>>()
        .join(", ")
}
