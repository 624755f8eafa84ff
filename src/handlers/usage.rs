//! Usage endpoints
//!
//! Expose the usage ledger to the admin dashboard

use crate::handlers::AppState;
use crate::usage::UsageRange;
use crate::utils::error::AppError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Query parameters for usage reads
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Optional time window: day, week, month or year
    pub range: Option<String>,
}

/// Return the usage ledger, optionally restricted to a time window
///
/// GET /usage[?range=day|week|month|year]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsageQuery>,
) -> Response {
    match query.range.as_deref() {
        None => Json(state.usage.snapshot()).into_response(),
        Some(raw) => match raw.parse::<UsageRange>() {
            Ok(range) => Json(state.usage.filtered(range)).into_response(),
            Err(message) => AppError::Validation(message).into_response(),
        },
    }
}

/// Rebuild the ledger aggregates from the event history
///
/// POST /usage/recompute
pub async fn recompute_usage(State(state): State<Arc<AppState>>) -> Response {
    info!("Recomputing usage aggregates from history");
    Json(state.usage.recompute()).into_response()
}

/// Drop all usage data
///
/// DELETE /usage
pub async fn clear_usage(State(state): State<Arc<AppState>>) -> Response {
    info!("Clearing usage data");
    state.usage.clear();
    StatusCode::NO_CONTENT.into_response()
}
