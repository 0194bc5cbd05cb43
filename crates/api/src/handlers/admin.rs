//! Admin endpoints: enrollment listing, cancellation review, refund
//! preview, and direct cancel.
//!
//! These are thin delegates into the cancellation service; the service
//! layer owns every invariant check.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use swimdesk_core::types::DbId;
use swimdesk_db::models::enrollment::EnrollmentListQuery;
use swimdesk_db::repositories::EnrollmentRepo;

use crate::error::AppResult;
use crate::query::{clamp_limit, clamp_offset, PaginationParams};
use crate::response::DataResponse;
use crate::services::cancellation;
use crate::state::AppState;

/// Query parameters for the refund preview.
#[derive(Debug, Default, Deserialize)]
pub struct RefundPreviewParams {
    /// Manual override of the usage-day count.
    pub days_used: Option<i32>,
}

/// Body for the approval endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    /// Manual override of the usage-day count committed with the refund.
    pub days_used: Option<i32>,
}

/// GET /api/v1/admin/enrollments
///
/// Filterable by lesson, user, and pay-status.
pub async fn list_enrollments(
    State(state): State<AppState>,
    Query(params): Query<EnrollmentListQuery>,
) -> AppResult<impl IntoResponse> {
    let enrollments = EnrollmentRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: enrollments }))
}

/// GET /api/v1/admin/cancel-requests
///
/// Open cancellation requests awaiting review, oldest first.
pub async fn list_cancel_requests(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);
    let requests = EnrollmentRepo::list_cancel_requests(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/admin/enrollments/{id}/refund-preview
///
/// Pure preview; commits nothing and can be called repeatedly with
/// different `days_used` values.
pub async fn refund_preview(
    State(state): State<AppState>,
    Path(enrollment_id): Path<DbId>,
    Query(params): Query<RefundPreviewParams>,
) -> AppResult<impl IntoResponse> {
    let breakdown = cancellation::preview(&state, enrollment_id, params.days_used).await?;
    Ok(Json(DataResponse { data: breakdown }))
}

/// POST /api/v1/admin/cancel-requests/{id}/approve
pub async fn approve_cancel(
    State(state): State<AppState>,
    Path(enrollment_id): Path<DbId>,
    body: Option<Json<ApproveBody>>,
) -> AppResult<impl IntoResponse> {
    let days_used = body.and_then(|Json(b)| b.days_used);
    let outcome = cancellation::approve(&state, enrollment_id, days_used).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/admin/cancel-requests/{id}/deny
pub async fn deny_cancel(
    State(state): State<AppState>,
    Path(enrollment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let enrollment = cancellation::deny(&state, enrollment_id).await?;
    Ok(Json(DataResponse { data: enrollment }))
}

/// POST /api/v1/admin/enrollments/{id}/cancel
///
/// Direct terminal cancel, bypassing the request/approve flow.
pub async fn admin_cancel(
    State(state): State<AppState>,
    Path(enrollment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let enrollment = cancellation::admin_cancel(&state, enrollment_id).await?;
    Ok(Json(DataResponse { data: enrollment }))
}
