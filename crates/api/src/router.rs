//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admin, enrollments, gateway, health, lockers};
use crate::state::AppState;

/// Root-level routes (health check lives outside `/api/v1`).
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health))
}

/// Everything under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Member-facing admission & cancellation.
        .route(
            "/lessons/{id}/enrollments",
            post(enrollments::create_enrollment),
        )
        .route("/lessons/{id}/renewals", post(enrollments::create_renewal))
        .route(
            "/enrollments/{id}/cancel-request",
            post(enrollments::cancel_request),
        )
        .route(
            "/users/{id}/enrollments",
            get(enrollments::list_user_enrollments),
        )
        // Locker availability.
        .route("/lockers/{category}", get(lockers::availability))
        // Payment-gateway webhook.
        .route("/gateway/notification", post(gateway::notification))
        // Admin surface.
        .route("/admin/enrollments", get(admin::list_enrollments))
        .route("/admin/enrollments/{id}/cancel", post(admin::admin_cancel))
        .route(
            "/admin/enrollments/{id}/refund-preview",
            get(admin::refund_preview),
        )
        .route("/admin/cancel-requests", get(admin::list_cancel_requests))
        .route(
            "/admin/cancel-requests/{id}/approve",
            post(admin::approve_cancel),
        )
        .route(
            "/admin/cancel-requests/{id}/deny",
            post(admin::deny_cancel),
        )
}
