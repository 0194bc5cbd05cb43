//! Member-facing enrollment endpoints.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use swimdesk_core::types::DbId;
use swimdesk_db::repositories::EnrollmentRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::services::{admission, cancellation};
use crate::state::AppState;

/// Body for `POST /api/v1/lessons/{id}/enrollments`.
#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentBody {
    pub user_id: DbId,
}

/// Body for `POST /api/v1/lessons/{id}/renewals`.
#[derive(Debug, Deserialize)]
pub struct CreateRenewalBody {
    pub user_id: DbId,
    #[serde(default)]
    pub wants_locker: bool,
}

/// Body for `POST /api/v1/enrollments/{id}/cancel-request`.
#[derive(Debug, Deserialize)]
pub struct CancelRequestBody {
    pub user_id: DbId,
}

/// POST /api/v1/lessons/{id}/enrollments
///
/// Create an unpaid hold against the lesson's capacity.
pub async fn create_enrollment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(lesson_id): Path<DbId>,
    Json(body): Json<CreateEnrollmentBody>,
) -> AppResult<impl IntoResponse> {
    let snapshot = admission::create(
        &state,
        body.user_id,
        lesson_id,
        Some(addr.ip().to_string()),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

/// POST /api/v1/lessons/{id}/renewals
///
/// Create a renewal hold; the locker request is recorded here and
/// resolved during payment reconciliation.
pub async fn create_renewal(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(lesson_id): Path<DbId>,
    Json(body): Json<CreateRenewalBody>,
) -> AppResult<impl IntoResponse> {
    let snapshot = admission::renew(
        &state,
        body.user_id,
        lesson_id,
        body.wants_locker,
        Some(addr.ip().to_string()),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

/// POST /api/v1/enrollments/{id}/cancel-request
///
/// Member-initiated cancellation; paid enrollments enter the refund
/// review queue.
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(enrollment_id): Path<DbId>,
    Json(body): Json<CancelRequestBody>,
) -> AppResult<impl IntoResponse> {
    let enrollment = cancellation::request(&state, enrollment_id, body.user_id).await?;
    Ok(Json(DataResponse { data: enrollment }))
}

/// GET /api/v1/users/{id}/enrollments
///
/// A member's own enrollments, newest first.
pub async fn list_user_enrollments(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let enrollments = EnrollmentRepo::list_by_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: enrollments }))
}
