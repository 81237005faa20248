//! Gallery management tests: slug handling, batch category editing, and
//! the file/row lifecycle for images.

mod common;

use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;

use common::*;
use darkroom::handlers::admin::{
    batch_edit_categories, delete_image, replace_image_file, upload_image, ReplaceParams,
};
use darkroom::handlers::gallery::{category_detail, view_gallery, GalleryQuery};
use darkroom::middleware::StaffContext;
use darkroom::util::unique_slug;

fn staff_context(state: &AppState) -> StaffContext {
    let conn = state.db.get().unwrap();
    let user = create_test_user(&conn, "admin", true);
    StaffContext { user }
}

fn batch(ops: Vec<CategoryOp>) -> Json<CategoryBatch> {
    Json(CategoryBatch { categories: ops })
}

#[test]
fn test_unique_slug_dedupes() {
    let conn = setup_test_db();
    let slug = unique_slug(&conn, "Portraits").unwrap();
    assert_eq!(slug, "portraits");
    queries::create_category(&conn, "Portraits", None, &slug).unwrap();

    let slug = unique_slug(&conn, "Portraits!").unwrap();
    assert_eq!(slug, "portraits-2");
    queries::create_category(&conn, "Portraits!", None, &slug).unwrap();

    let slug = unique_slug(&conn, "portraits").unwrap();
    assert_eq!(slug, "portraits-3");
}

#[tokio::test]
async fn test_batch_create_rename_delete_messages() {
    let state = create_test_app_state();
    let ctx = staff_context(&state);

    // Create two categories
    let Json(result) = batch_edit_categories(
        State(state.clone()),
        Extension(ctx.clone()),
        batch(vec![
            CategoryOp {
                id: None,
                name: Some("Weddings".to_string()),
                description: None,
                delete: false,
            },
            CategoryOp {
                id: None,
                name: Some("Portraits".to_string()),
                description: None,
                delete: false,
            },
        ]),
    )
    .await
    .expect("Batch failed");
    assert_eq!(
        result.messages,
        vec!["Categories 'Weddings', 'Portraits' have been created".to_string()]
    );

    let conn = state.db.get().unwrap();
    let categories = queries::list_categories(&conn).unwrap();
    assert_eq!(categories.len(), 2);
    let portraits = categories.iter().find(|c| c.name == "Portraits").unwrap();
    let portraits_id = portraits.id;
    let weddings_id = categories.iter().find(|c| c.name == "Weddings").unwrap().id;
    drop(categories);
    drop(conn);

    // Rename one, redescribe the other
    let Json(result) = batch_edit_categories(
        State(state.clone()),
        Extension(ctx.clone()),
        batch(vec![
            CategoryOp {
                id: Some(portraits_id),
                name: Some("Headshots".to_string()),
                description: None,
                delete: false,
            },
            CategoryOp {
                id: Some(weddings_id),
                name: Some("Weddings".to_string()),
                description: Some("Big days".to_string()),
                delete: false,
            },
        ]),
    )
    .await
    .expect("Batch failed");
    assert!(result
        .messages
        .contains(&"Category names changed: 'Portraits' changed to 'Headshots'".to_string()));
    assert!(result
        .messages
        .contains(&"Category Weddings's description has been updated".to_string()));

    let conn = state.db.get().unwrap();
    let renamed = queries::get_category(&conn, portraits_id).unwrap().unwrap();
    assert_eq!(renamed.name, "Headshots");
    assert_eq!(renamed.slug, "headshots");
    drop(conn);

    // Delete one
    let Json(result) = batch_edit_categories(
        State(state.clone()),
        Extension(ctx.clone()),
        batch(vec![CategoryOp {
            id: Some(weddings_id),
            name: None,
            description: None,
            delete: true,
        }]),
    )
    .await
    .expect("Batch failed");
    assert_eq!(
        result.messages,
        vec!["Category 'Weddings' and all associated images have been deleted".to_string()]
    );

    // Every change was activity-logged with the acting user
    let conn = state.db.get().unwrap();
    let activity = queries::list_activity(&conn).unwrap();
    assert!(activity.iter().all(|entry| entry.log.contains("by admin user admin")));
}

#[tokio::test]
async fn test_batch_with_no_changes_reports_none() {
    let state = create_test_app_state();
    let ctx = staff_context(&state);

    let category = {
        let conn = state.db.get().unwrap();
        queries::create_category(&conn, "Portraits", None, "portraits").unwrap()
    };

    let Json(result) = batch_edit_categories(
        State(state.clone()),
        Extension(ctx),
        batch(vec![CategoryOp {
            id: Some(category.id),
            name: Some("Portraits".to_string()),
            description: None,
            delete: false,
        }]),
    )
    .await
    .expect("Batch failed");

    assert_eq!(result.messages, vec!["No changes made".to_string()]);
    let conn = state.db.get().unwrap();
    assert!(queries::list_activity(&conn).unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_replace_and_delete_image_files() {
    let state = create_test_app_state();
    let ctx = staff_context(&state);

    let category = {
        let conn = state.db.get().unwrap();
        queries::create_category(&conn, "Portraits", None, "portraits").unwrap()
    };

    // Upload
    let (status, Json(image)) = upload_image(
        State(state.clone()),
        Extension(ctx.clone()),
        Path(category.id),
        Query(UploadParams {
            filename: "shoot one.jpg".to_string(),
            caption: Some("First shoot".to_string()),
        }),
        Bytes::from_static(b"jpegbytes"),
    )
    .await
    .expect("Upload failed");
    assert_eq!(status, axum::http::StatusCode::CREATED);
    let first_path = state.media.root().join(&image.filename);
    assert!(first_path.exists());

    // Replace: new file lands, superseded file goes
    let Json(replaced) = replace_image_file(
        State(state.clone()),
        Extension(ctx.clone()),
        Path(image.id),
        Query(ReplaceParams {
            filename: "retouched.jpg".to_string(),
        }),
        Bytes::from_static(b"betterjpegbytes"),
    )
    .await
    .expect("Replace failed");
    assert_ne!(replaced.filename, image.filename);
    assert!(!first_path.exists());
    assert!(state.media.root().join(&replaced.filename).exists());

    // Delete: record and file both go
    let status = delete_image(
        State(state.clone()),
        Extension(ctx),
        Path(image.id),
    )
    .await
    .expect("Delete failed");
    assert_eq!(status, axum::http::StatusCode::NO_CONTENT);
    assert!(!state.media.root().join(&replaced.filename).exists());

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_images(&conn).unwrap(), 0);
}

#[tokio::test]
async fn test_deleting_category_removes_image_files() {
    let state = create_test_app_state();
    let ctx = staff_context(&state);

    let category = {
        let conn = state.db.get().unwrap();
        queries::create_category(&conn, "Portraits", None, "portraits").unwrap()
    };

    let (_, Json(image)) = upload_image(
        State(state.clone()),
        Extension(ctx.clone()),
        Path(category.id),
        Query(UploadParams {
            filename: "keeper.jpg".to_string(),
            caption: None,
        }),
        Bytes::from_static(b"jpegbytes"),
    )
    .await
    .expect("Upload failed");
    let file_path = state.media.root().join(&image.filename);
    assert!(file_path.exists());

    batch_edit_categories(
        State(state.clone()),
        Extension(ctx),
        batch(vec![CategoryOp {
            id: Some(category.id),
            name: None,
            description: None,
            delete: true,
        }]),
    )
    .await
    .expect("Batch failed");

    assert!(!file_path.exists());
    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_images(&conn).unwrap(), 0);
    assert!(queries::get_category(&conn, category.id).unwrap().is_none());
}

#[tokio::test]
async fn test_public_gallery_view_filters_by_category() {
    let state = create_test_app_state();

    let portraits = {
        let conn = state.db.get().unwrap();
        let portraits = queries::create_category(&conn, "Portraits", None, "portraits").unwrap();
        let weddings = queries::create_category(&conn, "Weddings", None, "weddings").unwrap();
        queries::create_image(&conn, portraits.id, "p1.jpg", None).unwrap();
        queries::create_image(&conn, portraits.id, "p2.jpg", None).unwrap();
        queries::create_image(&conn, weddings.id, "w1.jpg", None).unwrap();
        portraits
    };

    // No filter: everything, selection "All"
    let Json(all) = view_gallery(State(state.clone()), Query(GalleryQuery { category: None }))
        .await
        .expect("Gallery view failed");
    assert_eq!(all.cat_selection, "All");
    assert_eq!(all.images.len(), 3);
    assert_eq!(all.total_image_count, 3);
    assert_eq!(all.categories.len(), 2);

    // Filtered: only that album's images, in id order
    let Json(filtered) = view_gallery(
        State(state.clone()),
        Query(GalleryQuery {
            category: Some(portraits.id),
        }),
    )
    .await
    .expect("Gallery view failed");
    assert_eq!(filtered.cat_selection, "Portraits");
    assert_eq!(filtered.images.len(), 2);
    assert!(filtered.images.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(filtered.total_image_count, 3);
}

#[tokio::test]
async fn test_album_detail_by_slug() {
    let state = create_test_app_state();

    {
        let conn = state.db.get().unwrap();
        let category = queries::create_category(&conn, "Portraits", None, "portraits").unwrap();
        queries::create_image(&conn, category.id, "p1.jpg", Some("caption")).unwrap();
    }

    let Json(detail) = category_detail(State(state.clone()), Path("portraits".to_string()))
        .await
        .expect("Album detail failed");
    assert_eq!(detail.category.name, "Portraits");
    assert_eq!(detail.images.len(), 1);

    let missing = category_detail(State(state.clone()), Path("nope".to_string())).await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let state = create_test_app_state();
    let ctx = staff_context(&state);

    let category = {
        let conn = state.db.get().unwrap();
        queries::create_category(&conn, "Portraits", None, "portraits").unwrap()
    };

    let result = upload_image(
        State(state.clone()),
        Extension(ctx),
        Path(category.id),
        Query(UploadParams {
            filename: "nothing.jpg".to_string(),
            caption: None,
        }),
        Bytes::new(),
    )
    .await;

    assert!(result.is_err());
    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_images(&conn).unwrap(), 0);
}
