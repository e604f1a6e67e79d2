//! Fraud case entity, its status vocabulary and the transition table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::FraudError;
use crate::types::alert::AlertSeverity;
use crate::types::transaction::Transaction;

/// Investigation status of a fraud case.
///
/// `Confirmed`, `FalsePositive` and `Resolved` are terminal: once entered,
/// no further status change is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    #[default]
    Pending,
    Investigating,
    Confirmed,
    FalsePositive,
    Resolved,
}

impl CaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaseStatus::Confirmed | CaseStatus::FalsePositive | CaseStatus::Resolved
        )
    }

    /// Transition table. Terminal sources are handled separately as
    /// `CaseAlreadyClosed`; re-asserting the current non-terminal status
    /// is legal (it still bumps `updated_at`).
    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        match self {
            s if s.is_terminal() => false,
            s if s == next => true,
            CaseStatus::Pending => true,
            CaseStatus::Investigating => next != CaseStatus::Pending,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "PENDING",
            CaseStatus::Investigating => "INVESTIGATING",
            CaseStatus::Confirmed => "CONFIRMED",
            CaseStatus::FalsePositive => "FALSE_POSITIVE",
            CaseStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, FraudError> {
        match value {
            "PENDING" => Ok(CaseStatus::Pending),
            "INVESTIGATING" => Ok(CaseStatus::Investigating),
            "CONFIRMED" => Ok(CaseStatus::Confirmed),
            "FALSE_POSITIVE" => Ok(CaseStatus::FalsePositive),
            "RESOLVED" => Ok(CaseStatus::Resolved),
            other => Err(FraudError::Validation(format!(
                "unknown case status '{other}' (expected PENDING, INVESTIGATING, CONFIRMED, FALSE_POSITIVE or RESOLVED)"
            ))),
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only investigation comment owned by exactly one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseNote {
    pub id: Uuid,
    pub author: String,
    pub note: String,
    /// Internal notes are not shown to the customer.
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

/// The unit of human fraud investigation.
///
/// References exactly one transaction; a transaction may carry any number
/// of cases. Never physically deleted, only closed via a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCase {
    pub id: Uuid,
    /// Unique generated identifier, e.g. `CASE-20260831-A1B2C3D4`. Immutable.
    pub case_number: String,
    pub transaction_id: Uuid,
    pub transaction_reference: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub status: CaseStatus,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub resolution_notes: Option<String>,
    pub estimated_loss: Option<Decimal>,
    pub actual_loss: Option<Decimal>,
    /// Insertion-ordered, append-only investigation log.
    pub notes: Vec<CaseNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on entering a terminal status. Never cleared.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Creation payload for a fraud case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
    pub transaction_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub estimated_loss: Option<Decimal>,
}

impl FraudCase {
    /// Validate the payload and open a PENDING case for `transaction`.
    pub fn new(
        input: NewCase,
        transaction: &Transaction,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, FraudError> {
        if input.title.trim().is_empty() {
            return Err(FraudError::Validation("case title must not be empty".into()));
        }
        if input.description.trim().is_empty() {
            return Err(FraudError::Validation(
                "case description must not be empty".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            case_number: generate_case_number(now),
            transaction_id: transaction.id,
            transaction_reference: transaction.reference.clone(),
            title: input.title,
            description: input.description,
            severity: input.severity,
            status: CaseStatus::Pending,
            assigned_to: input.assigned_to,
            created_by,
            resolution_notes: None,
            estimated_loss: input.estimated_loss,
            actual_loss: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        })
    }
}

/// Generate a unique case number: `CASE-<date>-<8 hex chars>`.
pub fn generate_case_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("CASE-{}-{}", now.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::NewTransaction;

    fn transaction() -> Transaction {
        Transaction::new(
            NewTransaction {
                reference: Some("TXN-CASE-1".into()),
                user_id: "user-9".into(),
                amount: "900".parse().unwrap(),
                currency: "EUR".into(),
                transaction_type: "transfer".into(),
                merchant_id: String::new(),
                merchant_name: String::new(),
                merchant_category: String::new(),
                ip_address: None,
                country: "DE".into(),
                city: String::new(),
                device_id: String::new(),
                transaction_date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn new_case(tx: &Transaction) -> NewCase {
        NewCase {
            transaction_id: tx.id,
            title: "Suspicious transfer".into(),
            description: "Velocity and location anomalies".into(),
            severity: AlertSeverity::High,
            assigned_to: None,
            estimated_loss: None,
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!CaseStatus::Pending.is_terminal());
        assert!(!CaseStatus::Investigating.is_terminal());
        assert!(CaseStatus::Confirmed.is_terminal());
        assert!(CaseStatus::FalsePositive.is_terminal());
        assert!(CaseStatus::Resolved.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        use CaseStatus::*;

        // Pending may move anywhere, including direct terminal shortcuts.
        for next in [Pending, Investigating, Confirmed, FalsePositive, Resolved] {
            assert!(Pending.can_transition_to(next), "PENDING -> {next}");
        }

        // Investigating may not fall back to Pending.
        assert!(!Investigating.can_transition_to(Pending));
        for next in [Investigating, Confirmed, FalsePositive, Resolved] {
            assert!(Investigating.can_transition_to(next));
        }

        // Terminal statuses are sticky.
        for terminal in [Confirmed, FalsePositive, Resolved] {
            for next in [Pending, Investigating, Confirmed, FalsePositive, Resolved] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn test_new_case_requires_title_and_description() {
        let tx = transaction();

        let mut no_title = new_case(&tx);
        no_title.title = "  ".into();
        assert!(FraudCase::new(no_title, &tx, None, Utc::now()).is_err());

        let mut no_description = new_case(&tx);
        no_description.description = String::new();
        assert!(FraudCase::new(no_description, &tx, None, Utc::now()).is_err());
    }

    #[test]
    fn test_new_case_starts_pending() {
        let tx = transaction();
        let case = FraudCase::new(new_case(&tx), &tx, Some("analyst@example.com".into()), Utc::now())
            .unwrap();
        assert_eq!(case.status, CaseStatus::Pending);
        assert!(case.resolved_at.is_none());
        assert!(case.notes.is_empty());
        assert!(case.case_number.starts_with("CASE-"));
        assert_eq!(case.transaction_reference, "TXN-CASE-1");
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert!(CaseStatus::parse("REOPENED").is_err());
        assert_eq!(
            CaseStatus::parse("FALSE_POSITIVE").unwrap(),
            CaseStatus::FalsePositive
        );
    }
}
