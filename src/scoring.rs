//! External fraud scoring boundary.
//!
//! The scoring model is a collaborator, not part of this service: it is
//! consumed as an opaque probability in `[0, 1]`. The HTTP scorer talks to
//! the ML service; the heuristic scorer is the local fallback used when the
//! service cannot be reached.

use async_trait::async_trait;
use chrono::Timelike;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::FraudError;
use crate::types::transaction::Transaction;

/// Produces a fraud probability for a transaction.
#[async_trait]
pub trait FraudScorer: Send + Sync {
    async fn score(&self, transaction: &Transaction) -> Result<f64, FraudError>;
}

/// Scorer backed by the external ML service.
pub struct HttpScorer {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    fraud_score: f64,
}

impl HttpScorer {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FraudError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FraudError::DependencyUnavailable(e.to_string()))?;
        Ok(Self { client, url })
    }

    /// Feature payload the scoring service expects.
    fn features(transaction: &Transaction) -> serde_json::Value {
        json!({
            "user_id": transaction.user_id,
            "amount": transaction.amount.to_string(),
            "transaction_type": transaction.transaction_type,
            "merchant_category": transaction.merchant_category,
            "country": transaction.country,
            "city": transaction.city,
            "hour": transaction.transaction_date.hour(),
            "day_of_week": transaction.transaction_date.format("%u").to_string(),
            "device_id": transaction.device_id,
        })
    }
}

#[async_trait]
impl FraudScorer for HttpScorer {
    async fn score(&self, transaction: &Transaction) -> Result<f64, FraudError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "transaction": Self::features(transaction) }))
            .send()
            .await
            .map_err(|e| FraudError::DependencyUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FraudError::DependencyUnavailable(format!(
                "scoring service returned status {}",
                response.status()
            )));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| FraudError::DependencyUnavailable(e.to_string()))?;

        if !body.fraud_score.is_finite() || !(0.0..=1.0).contains(&body.fraud_score) {
            return Err(FraudError::InvalidScore {
                score: body.fraud_score,
            });
        }

        debug!(
            transaction_reference = %transaction.reference,
            fraud_score = body.fraud_score,
            "Scored by external service"
        );
        Ok(body.fraud_score)
    }
}

/// Rule-of-thumb scorer used when no scoring service is configured or the
/// configured one is unreachable.
pub struct HeuristicScorer;

#[async_trait]
impl FraudScorer for HeuristicScorer {
    async fn score(&self, transaction: &Transaction) -> Result<f64, FraudError> {
        let mut score: f64 = 0.0;

        if transaction.amount > Decimal::from(50_000) {
            score += 0.3;
        } else if transaction.amount > Decimal::from(10_000) {
            score += 0.2;
        }

        let hour = transaction.transaction_date.hour();
        if hour < 6 || hour >= 23 {
            score += 0.2;
        }

        if transaction.ip_address.is_none() && transaction.country.is_empty() {
            score += 0.1;
        }

        Ok(score.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::NewTransaction;
    use chrono::{TimeZone, Utc};

    fn transaction(amount: &str, hour: u32) -> Transaction {
        let date = Utc.with_ymd_and_hms(2026, 8, 1, hour, 30, 0).unwrap();
        Transaction::new(
            NewTransaction {
                reference: None,
                user_id: "user-1".into(),
                amount: amount.parse().unwrap(),
                currency: "USD".into(),
                transaction_type: "payment".into(),
                merchant_id: String::new(),
                merchant_name: String::new(),
                merchant_category: String::new(),
                ip_address: Some("10.1.1.1".parse().unwrap()),
                country: "US".into(),
                city: String::new(),
                device_id: String::new(),
                transaction_date: Some(date),
            },
            date,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_heuristic_scores_stay_in_unit_interval() {
        let scorer = HeuristicScorer;
        for (amount, hour) in [("10", 12), ("20000", 3), ("90000", 23), ("90000", 2)] {
            let score = scorer.score(&transaction(amount, hour)).await.unwrap();
            assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        }
    }

    #[tokio::test]
    async fn test_heuristic_penalizes_amount_and_hour() {
        let scorer = HeuristicScorer;
        let quiet = scorer.score(&transaction("50", 14)).await.unwrap();
        let loud = scorer.score(&transaction("60000", 2)).await.unwrap();
        assert!(loud > quiet);
    }
}
