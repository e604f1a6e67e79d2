//! Transaction entity and its validating constructor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

use crate::classifier::RiskLevel;
use crate::error::FraudError;

/// ISO currency codes accepted on submission.
pub const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CHF", "JPY", "CAD", "AUD"];

/// Known transaction type codes.
pub const TRANSACTION_TYPES: &[&str] = &["payment", "transfer", "withdrawal", "deposit", "refund"];

/// Processing status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Rejected => "REJECTED",
            TransactionStatus::Flagged => "FLAGGED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, FraudError> {
        match value {
            "PENDING" => Ok(TransactionStatus::Pending),
            "APPROVED" => Ok(TransactionStatus::Approved),
            "REJECTED" => Ok(TransactionStatus::Rejected),
            "FLAGGED" => Ok(TransactionStatus::Flagged),
            other => Err(FraudError::Validation(format!(
                "unknown transaction status '{other}' (expected PENDING, APPROVED, REJECTED or FLAGGED)"
            ))),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A financial transaction under fraud analysis.
///
/// Immutable once processed except for `status`; the derived risk fields
/// are only ever written together through [`Transaction::record_score`],
/// which keeps `risk_level` a pure function of `fraud_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Unique human-facing reference, e.g. `TXN20260831120000A1B2C3D4`.
    pub reference: String,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_type: String,
    pub merchant_id: String,
    pub merchant_name: String,
    pub merchant_category: String,
    pub ip_address: Option<IpAddr>,
    pub country: String,
    pub city: String,
    pub device_id: String,
    /// Externally computed fraud probability, set exactly once.
    pub fraud_score: Option<f64>,
    pub risk_level: RiskLevel,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Set when the transaction is scored.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Submission payload for a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Generated when absent.
    #[serde(default)]
    pub reference: Option<String>,
    pub user_id: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_transaction_type")]
    pub transaction_type: String,
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub merchant_category: String,
    #[serde(default)]
    pub ip_address: Option<IpAddr>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_transaction_type() -> String {
    "payment".to_string()
}

impl Transaction {
    /// Validate a submission and build the PENDING transaction record.
    pub fn new(input: NewTransaction, now: DateTime<Utc>) -> Result<Self, FraudError> {
        if input.user_id.trim().is_empty() {
            return Err(FraudError::Validation("user_id must not be empty".into()));
        }
        if input.amount < Decimal::ZERO {
            return Err(FraudError::Validation(format!(
                "amount must be non-negative, got {}",
                input.amount
            )));
        }
        if !SUPPORTED_CURRENCIES.contains(&input.currency.as_str()) {
            return Err(FraudError::Validation(format!(
                "unknown currency code '{}'",
                input.currency
            )));
        }
        if !TRANSACTION_TYPES.contains(&input.transaction_type.as_str()) {
            return Err(FraudError::Validation(format!(
                "unknown transaction type '{}'",
                input.transaction_type
            )));
        }

        let reference = match input.reference {
            Some(reference) if !reference.trim().is_empty() => reference,
            _ => generate_reference(now),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            reference,
            user_id: input.user_id,
            amount: input.amount,
            currency: input.currency,
            transaction_type: input.transaction_type,
            merchant_id: input.merchant_id,
            merchant_name: input.merchant_name,
            merchant_category: input.merchant_category,
            ip_address: input.ip_address,
            country: input.country,
            city: input.city,
            device_id: input.device_id,
            fraud_score: None,
            risk_level: RiskLevel::Low,
            status: TransactionStatus::Pending,
            transaction_date: input.transaction_date.unwrap_or(now),
            created_at: now,
            processed_at: None,
        })
    }

    /// Record the fraud score and the derived risk level.
    ///
    /// A transaction is scored exactly once; a second call is a conflict.
    pub fn record_score(&mut self, score: f64, now: DateTime<Utc>) -> Result<(), FraudError> {
        if self.processed_at.is_some() {
            return Err(FraudError::Conflict(format!(
                "transaction {} is already scored",
                self.reference
            )));
        }
        self.risk_level = crate::classifier::classify(score)?;
        self.fraud_score = Some(score);
        self.processed_at = Some(now);
        Ok(())
    }
}

/// Generate a unique transaction reference: `TXN<timestamp><8 hex chars>`.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("TXN{}{}", now.format("%Y%m%d%H%M%S"), suffix)
}
