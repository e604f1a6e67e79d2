//! Alert endpoints: listing and acknowledgement.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::auth::Actor;
use crate::error::FraudError;
use crate::query::{AlertFilter, Page};
use crate::types::alert::{Alert, AlertSeverity};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    severity: Option<String>,
    acknowledged: Option<bool>,
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Alert>>, FraudError> {
    let filter = AlertFilter {
        severity: params
            .severity
            .as_deref()
            .map(AlertSeverity::parse)
            .transpose()?,
        acknowledged: params.acknowledged,
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(state.query.list_alerts(&filter)))
}

#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

pub async fn unacknowledged(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Alert>>, FraudError> {
    Ok(Json(
        state
            .query
            .unacknowledged_alerts(params.page, params.page_size),
    ))
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, FraudError> {
    actor.require_analyst()?;
    Ok(Json(state.detection.acknowledge_alert(id, &actor)?))
}
