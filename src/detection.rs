//! Transaction intake and fraud detection pipeline.
//!
//! Submission creates a PENDING transaction, fetches a fraud score from the
//! external scorer (with bounded retries), derives the risk level and the
//! processing status, runs the alert rule catalogue and, for high-severity
//! outcomes, opens an investigation case automatically.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::auth::Actor;
use crate::config::{DetectionConfig, ScoringConfig};
use crate::error::FraudError;
use crate::rules::AlertGenerator;
use crate::scoring::{FraudScorer, HeuristicScorer};
use crate::store::Store;
use crate::types::alert::{Alert, AlertSeverity};
use crate::types::case::{FraudCase, NewCase};
use crate::types::transaction::{NewTransaction, Transaction, TransactionStatus};
use uuid::Uuid;

pub struct DetectionService {
    store: Arc<Store>,
    scorer: Arc<dyn FraudScorer>,
    generator: AlertGenerator,
    detection: DetectionConfig,
    scoring: ScoringConfig,
}

impl DetectionService {
    pub fn new(
        store: Arc<Store>,
        scorer: Arc<dyn FraudScorer>,
        generator: AlertGenerator,
        detection: DetectionConfig,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            store,
            scorer,
            generator,
            detection,
            scoring,
        }
    }

    /// Process a submitted transaction end to end.
    ///
    /// If scoring fails after retries (and no fallback applies), the
    /// transaction stays PENDING and unscored; nothing partial is visible.
    pub async fn process_transaction(
        &self,
        input: NewTransaction,
    ) -> Result<Transaction, FraudError> {
        let transaction = Transaction::new(input, Utc::now())?;
        self.store.insert_transaction(transaction.clone())?;

        let score = self.fetch_score(&transaction).await?;

        let status = self.status_for(score);
        let updated = self.store.with_transaction_mut(transaction.id, |tx| {
            tx.record_score(score, Utc::now())?;
            tx.status = status;
            Ok(())
        })?;

        info!(
            transaction_reference = %updated.reference,
            fraud_score = score,
            risk_level = %updated.risk_level,
            status = %updated.status,
            "Transaction processed"
        );

        let alerts = self.generator.generate(&self.store, &updated, score)?;
        self.maybe_open_case(&updated, &alerts);

        Ok(updated)
    }

    /// Call the scorer with bounded retries and backoff. When retries are
    /// exhausted, either fall back to the local heuristic or surface
    /// `DependencyUnavailable`, per configuration.
    async fn fetch_score(&self, transaction: &Transaction) -> Result<f64, FraudError> {
        let mut last_error = None;

        for attempt in 0..=self.scoring.max_retries {
            if attempt > 0 {
                sleep(Duration::from_millis(
                    self.scoring.retry_backoff_ms * attempt as u64,
                ))
                .await;
            }
            match self.scorer.score(transaction).await {
                Ok(score) => return Ok(score),
                Err(e @ FraudError::DependencyUnavailable(_)) => {
                    warn!(
                        transaction_reference = %transaction.reference,
                        attempt,
                        error = %e,
                        "Scoring attempt failed"
                    );
                    last_error = Some(e);
                }
                Err(other) => return Err(other),
            }
        }

        if self.scoring.fallback_to_heuristic {
            warn!(
                transaction_reference = %transaction.reference,
                "Scoring service unavailable, using heuristic fallback"
            );
            return HeuristicScorer.score(transaction).await;
        }

        Err(last_error
            .unwrap_or_else(|| FraudError::DependencyUnavailable("scorer exhausted".into())))
    }

    fn status_for(&self, score: f64) -> TransactionStatus {
        if score >= self.detection.reject_threshold {
            TransactionStatus::Rejected
        } else if score >= self.detection.flag_threshold {
            TransactionStatus::Flagged
        } else {
            TransactionStatus::Approved
        }
    }

    /// High-severity alerts open an investigation case automatically, with
    /// the transaction amount as the initial loss estimate.
    fn maybe_open_case(&self, transaction: &Transaction, alerts: &[Alert]) {
        let Some(worst) = alerts.iter().map(|a| a.severity).max() else {
            return;
        };
        if worst < AlertSeverity::High {
            return;
        }

        let description = alerts
            .iter()
            .map(|a| a.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let case = FraudCase::new(
            NewCase {
                transaction_id: transaction.id,
                title: format!("Suspicious transaction {}", transaction.reference),
                description,
                severity: worst,
                assigned_to: None,
                estimated_loss: Some(transaction.amount),
            },
            transaction,
            None,
            Utc::now(),
        );
        match case {
            Ok(case) => {
                info!(
                    case_number = %case.case_number,
                    transaction_reference = %transaction.reference,
                    severity = %case.severity,
                    "Fraud case opened automatically"
                );
                self.store.insert_case(case);
            }
            Err(e) => warn!(error = %e, "Failed to open automatic case"),
        }
    }

    /// Acknowledge an alert. One-way and idempotent: the first caller is
    /// recorded, later calls return the alert unchanged.
    pub fn acknowledge_alert(&self, id: Uuid, actor: &Actor) -> Result<Alert, FraudError> {
        let updated = self.store.with_alert_mut(id, |alert| {
            alert.acknowledge(&actor.id, Utc::now());
            Ok(())
        })?;
        info!(
            alert_id = %updated.id,
            acknowledged_by = %actor.id,
            "Alert acknowledged"
        );
        Ok(updated)
    }

    /// Analyst decision on a flagged transaction.
    pub fn approve(&self, id: Uuid, actor: &Actor) -> Result<Transaction, FraudError> {
        self.decide(id, actor, TransactionStatus::Approved)
    }

    /// Analyst decision on a flagged transaction.
    pub fn reject(&self, id: Uuid, actor: &Actor) -> Result<Transaction, FraudError> {
        self.decide(id, actor, TransactionStatus::Rejected)
    }

    fn decide(
        &self,
        id: Uuid,
        actor: &Actor,
        decision: TransactionStatus,
    ) -> Result<Transaction, FraudError> {
        let updated = self.store.with_transaction_mut(id, |tx| {
            if tx.status != TransactionStatus::Flagged {
                return Err(FraudError::Validation(format!(
                    "only FLAGGED transactions can be decided manually, current status is {}",
                    tx.status
                )));
            }
            tx.status = decision;
            Ok(())
        })?;
        info!(
            transaction_reference = %updated.reference,
            status = %updated.status,
            decided_by = %actor.id,
            "Manual decision recorded"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::config::{AppConfig, RulesConfig};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedScorer(f64);

    #[async_trait]
    impl FraudScorer for FixedScorer {
        async fn score(&self, _: &Transaction) -> Result<f64, FraudError> {
            Ok(self.0)
        }
    }

    struct FlakyScorer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl FraudScorer for FlakyScorer {
        async fn score(&self, _: &Transaction) -> Result<f64, FraudError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FraudError::DependencyUnavailable("connection refused".into()))
        }
    }

    fn service(scorer: Arc<dyn FraudScorer>, fallback: bool) -> (Arc<Store>, DetectionService) {
        let store = Arc::new(Store::new());
        let config = AppConfig::default();
        let mut scoring = config.scoring.clone();
        scoring.fallback_to_heuristic = fallback;
        scoring.retry_backoff_ms = 1;
        let service = DetectionService::new(
            store.clone(),
            scorer,
            AlertGenerator::new(RulesConfig::default()),
            config.detection,
            scoring,
        );
        (store, service)
    }

    fn submission(amount: &str) -> NewTransaction {
        let date = Utc.with_ymd_and_hms(2026, 8, 1, 14, 0, 0).unwrap();
        NewTransaction {
            reference: None,
            user_id: "user-1".into(),
            amount: amount.parse().unwrap(),
            currency: "USD".into(),
            transaction_type: "payment".into(),
            merchant_id: String::new(),
            merchant_name: String::new(),
            merchant_category: String::new(),
            ip_address: None,
            country: "US".into(),
            city: String::new(),
            device_id: String::new(),
            transaction_date: Some(date),
        }
    }

    #[tokio::test]
    async fn test_low_score_is_approved_without_alerts() {
        let (store, service) = service(Arc::new(FixedScorer(0.1)), true);
        let tx = service.process_transaction(submission("50")).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Approved);
        assert_eq!(tx.risk_level, crate::classifier::RiskLevel::Low);
        assert!(store.alerts_for_transaction(tx.id).is_empty());
        assert!(store.cases_for_transaction(tx.id).is_empty());
    }

    #[tokio::test]
    async fn test_very_high_score_is_rejected() {
        let (_, service) = service(Arc::new(FixedScorer(0.95)), true);
        let tx = service.process_transaction(submission("50")).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Rejected);
    }

    #[tokio::test]
    async fn test_high_severity_alert_opens_case() {
        let (store, service) = service(Arc::new(FixedScorer(0.82)), true);
        let tx = service
            .process_transaction(submission("1200"))
            .await
            .unwrap();
        let cases = store.cases_for_transaction(tx.id);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].severity, AlertSeverity::High);
        assert_eq!(cases[0].estimated_loss, Some(tx.amount));
    }

    #[tokio::test]
    async fn test_scoring_failure_leaves_transaction_pending() {
        let scorer = Arc::new(FlakyScorer {
            calls: AtomicU32::new(0),
        });
        let (store, service) = service(scorer.clone(), false);

        let err = service
            .process_transaction(submission("50"))
            .await
            .unwrap_err();
        assert!(matches!(err, FraudError::DependencyUnavailable(_)));
        // max_retries = 2 means three attempts total.
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);

        let pending = store.transactions_snapshot();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, TransactionStatus::Pending);
        assert!(pending[0].fraud_score.is_none());
    }

    #[tokio::test]
    async fn test_manual_decision_requires_flagged() {
        let (_, service) = service(Arc::new(FixedScorer(0.1)), true);
        let tx = service.process_transaction(submission("50")).await.unwrap();
        let actor = Actor {
            id: "analyst@example.com".into(),
            role: Role::Analyst,
        };
        let err = service.approve(tx.id, &actor).unwrap_err();
        assert!(matches!(err, FraudError::Validation(_)));
    }

    #[tokio::test]
    async fn test_flagged_transaction_can_be_approved() {
        let (_, service) = service(Arc::new(FixedScorer(0.6)), true);
        let tx = service.process_transaction(submission("50")).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Flagged);

        let actor = Actor {
            id: "analyst@example.com".into(),
            role: Role::Analyst,
        };
        let approved = service.approve(tx.id, &actor).unwrap();
        assert_eq!(approved.status, TransactionStatus::Approved);
    }
}
