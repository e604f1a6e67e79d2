//! Rule-based alert generation.
//!
//! A fixed, ordered catalogue of predicates runs over each scored
//! transaction. Every triggered rule yields one alert, persisted rule by
//! rule: an error partway through leaves the alerts already written intact,
//! and a retry simply skips the rule types that already have an open alert.

use chrono::{Duration, Timelike, Utc};
use tracing::info;

use crate::config::RulesConfig;
use crate::error::FraudError;
use crate::store::Store;
use crate::types::alert::{Alert, AlertSeverity, AlertType};
use crate::types::transaction::Transaction;

pub struct AlertGenerator {
    config: RulesConfig,
}

impl AlertGenerator {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    /// Evaluate the rule catalogue and persist one alert per triggered rule.
    ///
    /// Idempotent per (transaction, rule type): a rule whose previous alert
    /// is still unacknowledged produces nothing on a second call. Returns
    /// the alerts created by this call, in rule order.
    pub fn generate(
        &self,
        store: &Store,
        transaction: &Transaction,
        score: f64,
    ) -> Result<Vec<Alert>, FraudError> {
        let triggered = self.evaluate(store, transaction, score);
        if triggered.is_empty() {
            return Ok(Vec::new());
        }

        let severity = severity_for(score, triggered.len());
        let now = Utc::now();
        let mut created = Vec::new();

        for (alert_type, message) in triggered {
            let alert = store.append_alert_if_absent(transaction.id, alert_type, || {
                Alert::new(transaction, alert_type, severity, message.clone(), now)
            });
            if let Some(alert) = alert {
                info!(
                    alert_id = %alert.id,
                    transaction_reference = %transaction.reference,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    "Alert created"
                );
                created.push(alert);
            }
        }

        Ok(created)
    }

    /// Run the ordered predicates; returns (rule, message) per match.
    fn evaluate(
        &self,
        store: &Store,
        transaction: &Transaction,
        score: f64,
    ) -> Vec<(AlertType, String)> {
        let mut triggered = Vec::new();

        if score >= self.config.score_alert_threshold {
            triggered.push((
                AlertType::HighScore,
                format!("fraud score {score:.2} at or above alert threshold"),
            ));
        }

        if transaction.amount > self.config.max_amount {
            triggered.push((
                AlertType::HighAmount,
                format!(
                    "transaction amount {} {} exceeds limit {}",
                    transaction.amount, transaction.currency, self.config.max_amount
                ),
            ));
        }

        let window_start =
            transaction.transaction_date - Duration::minutes(self.config.velocity_window_minutes);
        let recent = store.transaction_count_for_user_since(&transaction.user_id, window_start);
        if recent > self.config.velocity_limit {
            triggered.push((
                AlertType::HighVelocity,
                format!(
                    "{recent} transactions in the last {} minutes",
                    self.config.velocity_window_minutes
                ),
            ));
        }

        if let Some(previous) = store.last_transaction_before(
            &transaction.user_id,
            transaction.transaction_date,
            transaction.id,
        ) {
            let countries_known =
                !previous.country.is_empty() && !transaction.country.is_empty();
            if countries_known && previous.country != transaction.country {
                let elapsed = transaction.transaction_date - previous.transaction_date;
                if elapsed < Duration::hours(self.config.location_change_window_hours) {
                    triggered.push((
                        AlertType::LocationChange,
                        format!(
                            "location changed from {} to {} within {} minutes",
                            previous.country,
                            transaction.country,
                            elapsed.num_minutes()
                        ),
                    ));
                }
            }
        }

        let hour = transaction.transaction_date.hour();
        let (start, end) = (self.config.quiet_hours_start, self.config.quiet_hours_end);
        // The quiet window wraps midnight when start > end (e.g. 23..6).
        let in_quiet_hours = if start <= end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        };
        if in_quiet_hours {
            triggered.push((
                AlertType::UnusualHour,
                format!("transaction at unusual hour {hour:02}:00 UTC"),
            ));
        }

        triggered
    }
}

/// Alert severity from the score and the number of triggered rules.
pub fn severity_for(score: f64, triggered_rules: usize) -> AlertSeverity {
    if score >= 0.9 || triggered_rules >= 3 {
        AlertSeverity::Critical
    } else if score >= 0.7 || triggered_rules >= 2 {
        AlertSeverity::High
    } else if score >= 0.5 {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::types::transaction::NewTransaction;
    use chrono::{DateTime, TimeZone};

    fn generator() -> AlertGenerator {
        AlertGenerator::new(RulesConfig::default())
    }

    fn afternoon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 14, 0, 0).unwrap()
    }

    fn transaction(
        user: &str,
        amount: &str,
        country: &str,
        date: DateTime<Utc>,
    ) -> Transaction {
        Transaction::new(
            NewTransaction {
                reference: None,
                user_id: user.into(),
                amount: amount.parse().unwrap(),
                currency: "USD".into(),
                transaction_type: "payment".into(),
                merchant_id: String::new(),
                merchant_name: String::new(),
                merchant_category: String::new(),
                ip_address: None,
                country: country.into(),
                city: String::new(),
                device_id: String::new(),
                transaction_date: Some(date),
            },
            date,
        )
        .unwrap()
    }

    #[test]
    fn test_high_score_rule_only() {
        let store = Store::new();
        let tx = transaction("u1", "1200", "US", afternoon());
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.82).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HighScore);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let store = Store::new();
        let tx = transaction("u1", "1200", "US", afternoon());
        store.insert_transaction(tx.clone()).unwrap();

        let first = generator().generate(&store, &tx, 0.82).unwrap();
        assert_eq!(first.len(), 1);
        let second = generator().generate(&store, &tx, 0.82).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.alerts_for_transaction(tx.id).len(), 1);
    }

    #[test]
    fn test_high_amount_rule() {
        let store = Store::new();
        let tx = transaction("u1", "25000", "US", afternoon());
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.1).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HighAmount);
    }

    #[test]
    fn test_velocity_rule() {
        let store = Store::new();
        let base = afternoon();
        for i in 0..11 {
            let tx = transaction("burst-user", "10", "US", base - Duration::minutes(i));
            store.insert_transaction(tx).unwrap();
        }
        let tx = transaction("burst-user", "10", "US", base);
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.1).unwrap();
        assert!(alerts
            .iter()
            .any(|a| a.alert_type == AlertType::HighVelocity));
    }

    #[test]
    fn test_location_change_rule() {
        let store = Store::new();
        let base = afternoon();
        let previous = transaction("traveler", "10", "US", base - Duration::minutes(30));
        store.insert_transaction(previous).unwrap();
        let tx = transaction("traveler", "10", "BR", base);
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.1).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::LocationChange);
    }

    #[test]
    fn test_slow_location_change_does_not_fire() {
        let store = Store::new();
        let base = afternoon();
        let previous = transaction("traveler", "10", "US", base - Duration::hours(10));
        store.insert_transaction(previous).unwrap();
        let tx = transaction("traveler", "10", "BR", base);
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.1).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_unusual_hour_rule() {
        let store = Store::new();
        let night = Utc.with_ymd_and_hms(2026, 8, 1, 3, 0, 0).unwrap();
        let tx = transaction("u1", "10", "US", night);
        store.insert_transaction(tx.clone()).unwrap();

        let alerts = generator().generate(&store, &tx, 0.1).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::UnusualHour);
    }

    #[test]
    fn test_unusual_hour_non_wrapping_window() {
        let config = RulesConfig {
            quiet_hours_start: 1,
            quiet_hours_end: 6,
            ..RulesConfig::default()
        };
        let generator = AlertGenerator::new(config);
        let store = Store::new();

        // Daytime stays quiet even though the window does not wrap midnight.
        let tx = transaction("u1", "10", "US", afternoon());
        store.insert_transaction(tx.clone()).unwrap();
        assert!(generator.generate(&store, &tx, 0.1).unwrap().is_empty());

        let night = Utc.with_ymd_and_hms(2026, 8, 1, 3, 0, 0).unwrap();
        let tx = transaction("u2", "10", "US", night);
        store.insert_transaction(tx.clone()).unwrap();
        let alerts = generator.generate(&store, &tx, 0.1).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::UnusualHour);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_for(0.95, 1), AlertSeverity::Critical);
        assert_eq!(severity_for(0.2, 3), AlertSeverity::Critical);
        assert_eq!(severity_for(0.75, 1), AlertSeverity::High);
        assert_eq!(severity_for(0.2, 2), AlertSeverity::High);
        assert_eq!(severity_for(0.55, 1), AlertSeverity::Medium);
        assert_eq!(severity_for(0.2, 1), AlertSeverity::Low);
    }
}
