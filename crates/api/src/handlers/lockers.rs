//! Locker availability endpoint.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::services::locker;
use crate::state::AppState;

/// GET /api/v1/lockers/{category}
///
/// Availability for one category. Unknown categories read as zero
/// capacity rather than 404, mirroring the inventory manager's
/// missing-record behaviour.
pub async fn availability(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<impl IntoResponse> {
    let availability = locker::availability(&state.pool, &category).await?;
    Ok(Json(DataResponse { data: availability }))
}
