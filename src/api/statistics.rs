//! Dashboard statistics and trend endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::error::FraudError;
use crate::query::{DashboardStats, TrendPoint};

#[derive(Debug, Deserialize, Default)]
pub struct WindowParams {
    days: Option<i64>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<DashboardStats>, FraudError> {
    let days = params.days.unwrap_or(7);
    Ok(Json(state.query.dashboard_stats(days)?))
}

pub async fn trends(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<TrendPoint>>, FraudError> {
    let days = params.days.unwrap_or(30);
    Ok(Json(state.query.trends(days)?))
}
