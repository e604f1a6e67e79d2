//! Transaction endpoints: submission, listing and analyst decisions.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::auth::Actor;
use crate::classifier::RiskLevel;
use crate::error::FraudError;
use crate::query::{Page, TransactionDetail, TransactionFilter};
use crate::types::transaction::{NewTransaction, Transaction, TransactionStatus};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    status: Option<String>,
    risk_level: Option<String>,
    user_id: Option<String>,
    search: Option<String>,
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Transaction>>, FraudError> {
    let filter = TransactionFilter {
        status: params
            .status
            .as_deref()
            .map(TransactionStatus::parse)
            .transpose()?,
        risk_level: params
            .risk_level
            .as_deref()
            .map(RiskLevel::parse)
            .transpose()?,
        user_id: params.user_id,
        search: params.search,
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(state.query.list_transactions(&filter)))
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewTransaction>,
) -> Result<Json<TransactionDetail>, FraudError> {
    actor.require_analyst()?;
    let transaction = state.detection.process_transaction(input).await?;
    Ok(Json(state.query.transaction_detail(transaction.id)?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDetail>, FraudError> {
    Ok(Json(state.query.transaction_detail(id)?))
}

#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    page_size: usize,
}

pub async fn flagged(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Transaction>>, FraudError> {
    Ok(Json(
        state.query.flagged_transactions(params.page, params.page_size),
    ))
}

pub async fn high_risk(
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, FraudError> {
    Ok(Json(state.query.high_risk_transactions()))
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, FraudError> {
    actor.require_analyst()?;
    Ok(Json(state.detection.approve(id, &actor)?))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, FraudError> {
    actor.require_analyst()?;
    Ok(Json(state.detection.reject(id, &actor)?))
}
