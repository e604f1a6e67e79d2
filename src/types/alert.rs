//! Fraud alert entity.
//!
//! Alerts are append-only signals tied to exactly one transaction. They are
//! mutated only by acknowledgement, which is one-way and idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::FraudError;
use crate::types::transaction::Transaction;

/// Alert severity, ordered `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }

    pub fn parse(value: &str) -> Result<Self, FraudError> {
        match value {
            "LOW" => Ok(AlertSeverity::Low),
            "MEDIUM" => Ok(AlertSeverity::Medium),
            "HIGH" => Ok(AlertSeverity::High),
            "CRITICAL" => Ok(AlertSeverity::Critical),
            other => Err(FraudError::Validation(format!(
                "unknown severity '{other}' (expected LOW, MEDIUM, HIGH or CRITICAL)"
            ))),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed catalogue of rule types an alert can carry.
///
/// At most one unacknowledged alert of a given type exists per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    HighScore,
    HighAmount,
    HighVelocity,
    LocationChange,
    UnusualHour,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighScore => "high_score",
            AlertType::HighAmount => "high_amount",
            AlertType::HighVelocity => "high_velocity",
            AlertType::LocationChange => "location_change",
            AlertType::UnusualHour => "unusual_hour",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated signal flagging a specific rule match on a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub transaction_id: Uuid,
    /// Denormalized for display without a second lookup.
    pub transaction_reference: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub is_acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        transaction: &Transaction,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id: transaction.id,
            transaction_reference: transaction.reference.clone(),
            alert_type,
            severity,
            message,
            is_acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at: now,
        }
    }

    /// One-way, idempotent acknowledgement. The first caller wins the
    /// bookkeeping fields; later calls change nothing.
    pub fn acknowledge(&mut self, actor: &str, now: DateTime<Utc>) {
        if self.is_acknowledged {
            return;
        }
        self.is_acknowledged = true;
        self.acknowledged_by = Some(actor.to_string());
        self.acknowledged_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::NewTransaction;

    fn transaction() -> Transaction {
        Transaction::new(
            NewTransaction {
                reference: Some("TXN-TEST-1".into()),
                user_id: "user-1".into(),
                amount: "250".parse().unwrap(),
                currency: "USD".into(),
                transaction_type: "payment".into(),
                merchant_id: String::new(),
                merchant_name: String::new(),
                merchant_category: String::new(),
                ip_address: None,
                country: "US".into(),
                city: String::new(),
                device_id: String::new(),
                transaction_date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let tx = transaction();
        let mut alert = Alert::new(
            &tx,
            AlertType::HighScore,
            AlertSeverity::High,
            "score over threshold".into(),
            Utc::now(),
        );

        alert.acknowledge("analyst@example.com", Utc::now());
        let first_ack_at = alert.acknowledged_at;
        assert!(alert.is_acknowledged);

        alert.acknowledge("someone-else@example.com", Utc::now());
        assert_eq!(alert.acknowledged_by.as_deref(), Some("analyst@example.com"));
        assert_eq!(alert.acknowledged_at, first_ack_at);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }

    #[test]
    fn test_alert_serialization() {
        let tx = transaction();
        let alert = Alert::new(
            &tx,
            AlertType::HighVelocity,
            AlertSeverity::Medium,
            "11 transactions in the last hour".into(),
            Utc::now(),
        );
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"high_velocity\""));
        assert!(json.contains("\"MEDIUM\""));
        let back: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(back.alert_type, AlertType::HighVelocity);
        assert_eq!(back.transaction_reference, "TXN-TEST-1");
    }
}
