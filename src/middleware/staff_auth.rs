use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::models::User;
use crate::util::extract_bearer_token;

/// The authenticated staff user, attached to requests that pass
/// [`staff_auth`].
#[derive(Clone)]
pub struct StaffContext {
    pub user: User,
}

/// Gate for the admin surface: bearer API key must resolve to a staff user.
///
/// Missing or unknown keys get 401; a valid key for a non-staff user gets
/// 403 (the JSON-API counterpart of the old redirect to the
/// permission-denied page).
pub async fn staff_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = queries::get_user_by_api_key(&conn, token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !user.is_staff {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(StaffContext { user });
    Ok(next.run(request).await)
}
