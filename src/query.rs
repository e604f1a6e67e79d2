//! Read-side queries: filtered listings, dashboard statistics and trends.
//!
//! Every operation works on a snapshot taken once per call, so page
//! boundaries are stable within the call and no reader ever blocks a
//! writer. Aggregates only ever see committed state.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::classifier::RiskLevel;
use crate::error::FraudError;
use crate::store::Store;
use crate::types::alert::{Alert, AlertSeverity};
use crate::types::case::{CaseStatus, FraudCase};
use crate::types::transaction::{Transaction, TransactionStatus};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;
const HIGH_RISK_LIMIT: usize = 50;
/// Statistics windows are capped at one year.
const MAX_WINDOW_DAYS: i64 = 365;

/// One page of results plus paging bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

fn paginate<T>(mut items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    };
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = (start + page_size).min(total);
    let items = items.drain(start..end).collect();
    Page {
        items,
        total,
        page,
        page_size,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub risk_level: Option<RiskLevel>,
    pub user_id: Option<String>,
    /// Substring match against reference and user id.
    pub search: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub severity: Option<AlertSeverity>,
    pub assigned_to: Option<String>,
    pub search: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub severity: Option<AlertSeverity>,
    pub acknowledged: Option<bool>,
    pub page: usize,
    pub page_size: usize,
}

/// Transaction with its nested alerts and cases, for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub alerts: Vec<Alert>,
    pub fraud_cases: Vec<FraudCase>,
}

/// Case with the underlying transaction, for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: FraudCase,
    pub transaction_details: Transaction,
}

/// Dashboard counters over a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_transactions: usize,
    pub flagged_transactions: usize,
    pub total_alerts: usize,
    pub high_severity_alerts: usize,
    pub active_cases: usize,
    pub resolved_cases: usize,
    pub total_estimated_loss: Decimal,
    /// Flagged share of all transactions in the window, as a percentage.
    pub fraud_rate: f64,
    pub average_fraud_score: f64,
}

/// One calendar day of transaction volume.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total_transactions: usize,
    pub flagged_transactions: usize,
    pub fraud_rate: f64,
}

pub struct QueryService {
    store: Arc<Store>,
}

impl QueryService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list_transactions(&self, filter: &TransactionFilter) -> Page<Transaction> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut items: Vec<Transaction> = self
            .store
            .transactions_snapshot()
            .into_iter()
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.risk_level.map_or(true, |r| t.risk_level == r))
            .filter(|t| {
                filter
                    .user_id
                    .as_deref()
                    .map_or(true, |u| t.user_id == u)
            })
            .filter(|t| {
                needle.as_deref().map_or(true, |needle| {
                    t.reference.to_lowercase().contains(needle)
                        || t.user_id.to_lowercase().contains(needle)
                })
            })
            .collect();
        items.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        paginate(items, filter.page, filter.page_size)
    }

    /// Flagged transactions awaiting review, newest first.
    pub fn flagged_transactions(&self, page: usize, page_size: usize) -> Page<Transaction> {
        self.list_transactions(&TransactionFilter {
            status: Some(TransactionStatus::Flagged),
            page,
            page_size,
            ..Default::default()
        })
    }

    /// HIGH and CRITICAL risk transactions, highest score first, capped.
    pub fn high_risk_transactions(&self) -> Vec<Transaction> {
        let mut items: Vec<Transaction> = self
            .store
            .transactions_snapshot()
            .into_iter()
            .filter(|t| t.risk_level >= RiskLevel::High)
            .collect();
        items.sort_by(|a, b| {
            b.fraud_score
                .unwrap_or(0.0)
                .total_cmp(&a.fraud_score.unwrap_or(0.0))
        });
        items.truncate(HIGH_RISK_LIMIT);
        items
    }

    pub fn transaction_detail(&self, id: Uuid) -> Result<TransactionDetail, FraudError> {
        let transaction = self.store.transaction(id)?;
        let alerts = self.store.alerts_for_transaction(id);
        let fraud_cases = self.store.cases_for_transaction(id);
        Ok(TransactionDetail {
            transaction,
            alerts,
            fraud_cases,
        })
    }

    pub fn list_cases(&self, filter: &CaseFilter) -> Page<FraudCase> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut items: Vec<FraudCase> = self
            .store
            .cases_snapshot()
            .into_iter()
            .filter(|c| filter.status.map_or(true, |s| c.status == s))
            .filter(|c| filter.severity.map_or(true, |s| c.severity == s))
            .filter(|c| {
                filter
                    .assigned_to
                    .as_deref()
                    .map_or(true, |u| c.assigned_to.as_deref() == Some(u))
            })
            .filter(|c| {
                needle.as_deref().map_or(true, |needle| {
                    c.case_number.to_lowercase().contains(needle)
                        || c.title.to_lowercase().contains(needle)
                        || c.transaction_reference.to_lowercase().contains(needle)
                })
            })
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        paginate(items, filter.page, filter.page_size)
    }

    pub fn case_detail(&self, id: Uuid) -> Result<CaseDetail, FraudError> {
        let case = self.store.case(id)?;
        let transaction_details = self.store.transaction(case.transaction_id)?;
        Ok(CaseDetail {
            case,
            transaction_details,
        })
    }

    pub fn list_alerts(&self, filter: &AlertFilter) -> Page<Alert> {
        let mut items: Vec<Alert> = self
            .store
            .alerts_snapshot()
            .into_iter()
            .filter(|a| filter.severity.map_or(true, |s| a.severity == s))
            .filter(|a| {
                filter
                    .acknowledged
                    .map_or(true, |ack| a.is_acknowledged == ack)
            })
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        paginate(items, filter.page, filter.page_size)
    }

    /// Unacknowledged alerts, most severe first.
    pub fn unacknowledged_alerts(&self, page: usize, page_size: usize) -> Page<Alert> {
        let mut items: Vec<Alert> = self
            .store
            .alerts_snapshot()
            .into_iter()
            .filter(|a| !a.is_acknowledged)
            .collect();
        items.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.created_at.cmp(&a.created_at))
        });
        paginate(items, page, page_size)
    }

    /// Dashboard counters over `[now - window_days, now]`.
    pub fn dashboard_stats(&self, window_days: i64) -> Result<DashboardStats, FraudError> {
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(FraudError::InvalidWindow { days: window_days });
        }
        let start = Utc::now() - Duration::days(window_days);

        let transactions = self.store.transactions_snapshot();
        let in_window: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.created_at >= start)
            .collect();
        let total_transactions = in_window.len();
        let flagged_transactions = in_window
            .iter()
            .filter(|t| t.status == TransactionStatus::Flagged)
            .count();

        let alerts = self.store.alerts_snapshot();
        let total_alerts = alerts.iter().filter(|a| a.created_at >= start).count();
        let high_severity_alerts = alerts
            .iter()
            .filter(|a| a.created_at >= start && a.severity >= AlertSeverity::High)
            .count();

        let cases = self.store.cases_snapshot();
        let active_cases = cases.iter().filter(|c| !c.status.is_terminal()).count();
        let resolved_cases = cases
            .iter()
            .filter(|c| c.resolved_at.map_or(false, |at| at >= start))
            .count();
        let total_estimated_loss = cases
            .iter()
            .filter(|c| c.created_at >= start)
            .filter_map(|c| c.estimated_loss)
            .sum();

        let fraud_rate = if total_transactions > 0 {
            round2(flagged_transactions as f64 / total_transactions as f64 * 100.0)
        } else {
            0.0
        };

        let scores: Vec<f64> = in_window.iter().filter_map(|t| t.fraud_score).collect();
        let average_fraud_score = if scores.is_empty() {
            0.0
        } else {
            round3(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Ok(DashboardStats {
            total_transactions,
            flagged_transactions,
            total_alerts,
            high_severity_alerts,
            active_cases,
            resolved_cases,
            total_estimated_loss,
            fraud_rate,
            average_fraud_score,
        })
    }

    /// One row per calendar day over the window, oldest first. Days without
    /// data are zero-filled.
    pub fn trends(&self, window_days: i64) -> Result<Vec<TrendPoint>, FraudError> {
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(FraudError::InvalidWindow { days: window_days });
        }

        let transactions = self.store.transactions_snapshot();
        let today = Utc::now().date_naive();

        let mut points = Vec::with_capacity(window_days as usize);
        for offset in (0..window_days).rev() {
            let date = today - Duration::days(offset);
            let mut total = 0usize;
            let mut flagged = 0usize;
            for t in &transactions {
                if t.transaction_date.date_naive() == date {
                    total += 1;
                    if t.status == TransactionStatus::Flagged {
                        flagged += 1;
                    }
                }
            }
            let fraud_rate = if total > 0 {
                round2(flagged as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            points.push(TrendPoint {
                date,
                total_transactions: total,
                flagged_transactions: flagged,
                fraud_rate,
            });
        }
        Ok(points)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
