//! Fraud case endpoints: creation, assignment, status changes and notes.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::auth::Actor;
use crate::error::FraudError;
use crate::query::{CaseDetail, CaseFilter, Page};
use crate::types::alert::AlertSeverity;
use crate::types::case::{CaseNote, CaseStatus, FraudCase, NewCase};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    status: Option<String>,
    severity: Option<String>,
    assigned_to: Option<String>,
    search: Option<String>,
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<FraudCase>>, FraudError> {
    let filter = CaseFilter {
        status: params
            .status
            .as_deref()
            .map(CaseStatus::parse)
            .transpose()?,
        severity: params
            .severity
            .as_deref()
            .map(AlertSeverity::parse)
            .transpose()?,
        assigned_to: params.assigned_to,
        search: params.search,
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(state.query.list_cases(&filter)))
}

/// Case creation payload. The severity arrives as a string so unknown
/// values surface as a validation error rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct CreateCaseRequest {
    pub transaction_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub estimated_loss: Option<Decimal>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateCaseRequest>,
) -> Result<Json<FraudCase>, FraudError> {
    actor.require_analyst()?;
    let input = NewCase {
        transaction_id: request.transaction_id,
        title: request.title,
        description: request.description,
        severity: AlertSeverity::parse(&request.severity)?,
        assigned_to: request.assigned_to,
        estimated_loss: request.estimated_loss,
    };
    Ok(Json(state.lifecycle.create_case(input, &actor)?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseDetail>, FraudError> {
    Ok(Json(state.query.case_detail(id)?))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: String,
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<FraudCase>, FraudError> {
    actor.require_analyst()?;
    if request.user_id.trim().is_empty() {
        return Err(FraudError::Validation("user_id is required".into()));
    }
    Ok(Json(state.lifecycle.assign(id, request.user_id)?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<FraudCase>, FraudError> {
    actor.require_analyst()?;
    let new_status = CaseStatus::parse(&request.status)?;
    Ok(Json(state.lifecycle.update_status(
        id,
        new_status,
        request.resolution_notes,
    )?))
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub note: String,
    #[serde(default = "default_is_internal")]
    pub is_internal: bool,
}

fn default_is_internal() -> bool {
    true
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> Result<Json<CaseNote>, FraudError> {
    actor.require_analyst()?;
    Ok(Json(state.lifecycle.add_note(
        id,
        &actor,
        request.note,
        request.is_internal,
    )?))
}
