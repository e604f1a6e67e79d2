//! In-process entity store.
//!
//! Arena-style identity maps keyed by entity id. Mutations go through the
//! map's exclusive per-key entry access, which serializes concurrent writers
//! against the same entity without a global lock; readers work on cloned
//! snapshots and never block writers.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::FraudError;
use crate::types::alert::{Alert, AlertType};
use crate::types::case::FraudCase;
use crate::types::transaction::Transaction;

#[derive(Default)]
pub struct Store {
    transactions: DashMap<Uuid, Transaction>,
    tx_by_reference: DashMap<String, Uuid>,
    alerts: DashMap<Uuid, Alert>,
    /// Alert ids per transaction. The entry for a transaction doubles as the
    /// serialization scope for alert generation on that transaction.
    alerts_by_tx: DashMap<Uuid, Vec<Uuid>>,
    cases: DashMap<Uuid, FraudCase>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- transactions ----

    /// Insert a new transaction, enforcing reference uniqueness.
    pub fn insert_transaction(&self, transaction: Transaction) -> Result<(), FraudError> {
        match self.tx_by_reference.entry(transaction.reference.clone()) {
            Entry::Occupied(_) => Err(FraudError::Validation(format!(
                "transaction reference '{}' already exists",
                transaction.reference
            ))),
            Entry::Vacant(slot) => {
                slot.insert(transaction.id);
                self.transactions.insert(transaction.id, transaction);
                Ok(())
            }
        }
    }

    pub fn transaction(&self, id: Uuid) -> Result<Transaction, FraudError> {
        self.transactions
            .get(&id)
            .map(|t| t.clone())
            .ok_or_else(|| FraudError::NotFound {
                entity: "transaction",
                id: id.to_string(),
            })
    }

    /// Apply a mutation to one transaction under its entry lock and return
    /// the updated snapshot.
    pub fn with_transaction_mut<F>(&self, id: Uuid, f: F) -> Result<Transaction, FraudError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), FraudError>,
    {
        let mut entry = self
            .transactions
            .get_mut(&id)
            .ok_or_else(|| FraudError::NotFound {
                entity: "transaction",
                id: id.to_string(),
            })?;
        f(entry.value_mut())?;
        Ok(entry.clone())
    }

    pub fn transactions_snapshot(&self) -> Vec<Transaction> {
        self.transactions.iter().map(|t| t.clone()).collect()
    }

    /// Number of transactions a user made at or after `since`.
    pub fn transaction_count_for_user_since(&self, user_id: &str, since: DateTime<Utc>) -> usize {
        self.transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.transaction_date >= since)
            .count()
    }

    /// The user's most recent transaction strictly before `before`,
    /// excluding the transaction currently being evaluated.
    pub fn last_transaction_before(
        &self,
        user_id: &str,
        before: DateTime<Utc>,
        exclude: Uuid,
    ) -> Option<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.id != exclude && t.transaction_date < before)
            .max_by_key(|t| t.transaction_date)
            .map(|t| t.clone())
    }

    // ---- alerts ----

    /// Create and persist an alert unless an unacknowledged alert of the
    /// same type already exists for the transaction.
    ///
    /// The check and the append happen under the transaction's alert-index
    /// entry lock, so concurrent generation for the same transaction cannot
    /// double up on a rule type. Returns `None` when deduplicated.
    pub fn append_alert_if_absent<F>(
        &self,
        transaction_id: Uuid,
        alert_type: AlertType,
        build: F,
    ) -> Option<Alert>
    where
        F: FnOnce() -> Alert,
    {
        let mut index = self.alerts_by_tx.entry(transaction_id).or_default();
        let open_duplicate = index.iter().any(|alert_id| {
            self.alerts
                .get(alert_id)
                .map(|a| a.alert_type == alert_type && !a.is_acknowledged)
                .unwrap_or(false)
        });
        if open_duplicate {
            return None;
        }

        let alert = build();
        index.push(alert.id);
        self.alerts.insert(alert.id, alert.clone());
        Some(alert)
    }

    pub fn alert(&self, id: Uuid) -> Result<Alert, FraudError> {
        self.alerts
            .get(&id)
            .map(|a| a.clone())
            .ok_or_else(|| FraudError::NotFound {
                entity: "alert",
                id: id.to_string(),
            })
    }

    pub fn with_alert_mut<F>(&self, id: Uuid, f: F) -> Result<Alert, FraudError>
    where
        F: FnOnce(&mut Alert) -> Result<(), FraudError>,
    {
        let mut entry = self.alerts.get_mut(&id).ok_or_else(|| FraudError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        f(entry.value_mut())?;
        Ok(entry.clone())
    }

    pub fn alerts_snapshot(&self) -> Vec<Alert> {
        self.alerts.iter().map(|a| a.clone()).collect()
    }

    pub fn alerts_for_transaction(&self, transaction_id: Uuid) -> Vec<Alert> {
        let Some(index) = self.alerts_by_tx.get(&transaction_id) else {
            return Vec::new();
        };
        index
            .iter()
            .filter_map(|alert_id| self.alerts.get(alert_id).map(|a| a.clone()))
            .collect()
    }

    // ---- cases ----

    pub fn insert_case(&self, case: FraudCase) {
        self.cases.insert(case.id, case);
    }

    pub fn case(&self, id: Uuid) -> Result<FraudCase, FraudError> {
        self.cases
            .get(&id)
            .map(|c| c.clone())
            .ok_or_else(|| FraudError::NotFound {
                entity: "case",
                id: id.to_string(),
            })
    }

    /// Apply a mutation to one case under its entry lock and return the
    /// updated snapshot. All lifecycle writes funnel through here, which
    /// gives each case a single total order of updates.
    pub fn with_case_mut<F>(&self, id: Uuid, f: F) -> Result<FraudCase, FraudError>
    where
        F: FnOnce(&mut FraudCase) -> Result<(), FraudError>,
    {
        let mut entry = self.cases.get_mut(&id).ok_or_else(|| FraudError::NotFound {
            entity: "case",
            id: id.to_string(),
        })?;
        f(entry.value_mut())?;
        Ok(entry.clone())
    }

    pub fn cases_snapshot(&self) -> Vec<FraudCase> {
        self.cases.iter().map(|c| c.clone()).collect()
    }

    pub fn cases_for_transaction(&self, transaction_id: Uuid) -> Vec<FraudCase> {
        self.cases
            .iter()
            .filter(|c| c.transaction_id == transaction_id)
            .map(|c| c.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::alert::AlertSeverity;
    use crate::types::transaction::NewTransaction;

    fn transaction(reference: &str) -> Transaction {
        Transaction::new(
            NewTransaction {
                reference: Some(reference.into()),
                user_id: "user-1".into(),
                amount: "100".parse().unwrap(),
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
    fn test_duplicate_reference_rejected() {
        let store = Store::new();
        store.insert_transaction(transaction("TXN-1")).unwrap();
        let err = store.insert_transaction(transaction("TXN-1")).unwrap_err();
        assert!(matches!(err, FraudError::Validation(_)));
    }

    #[test]
    fn test_alert_dedup_per_type() {
        let store = Store::new();
        let tx = transaction("TXN-2");
        store.insert_transaction(tx.clone()).unwrap();

        let first = store.append_alert_if_absent(tx.id, AlertType::HighScore, || {
            Alert::new(
                &tx,
                AlertType::HighScore,
                AlertSeverity::High,
                "score 0.82".into(),
                Utc::now(),
            )
        });
        assert!(first.is_some());

        // Same type with an open alert: deduplicated.
        let second = store.append_alert_if_absent(tx.id, AlertType::HighScore, || {
            panic!("builder must not run when deduplicated")
        });
        assert!(second.is_none());

        // Different type is unaffected.
        let other = store.append_alert_if_absent(tx.id, AlertType::UnusualHour, || {
            Alert::new(
                &tx,
                AlertType::UnusualHour,
                AlertSeverity::Low,
                "03:00".into(),
                Utc::now(),
            )
        });
        assert!(other.is_some());
        assert_eq!(store.alerts_for_transaction(tx.id).len(), 2);
    }

    #[test]
    fn test_acknowledged_alert_allows_new_one() {
        let store = Store::new();
        let tx = transaction("TXN-3");
        store.insert_transaction(tx.clone()).unwrap();

        let alert = store
            .append_alert_if_absent(tx.id, AlertType::HighAmount, || {
                Alert::new(
                    &tx,
                    AlertType::HighAmount,
                    AlertSeverity::Medium,
                    "amount".into(),
                    Utc::now(),
                )
            })
            .unwrap();

        store
            .with_alert_mut(alert.id, |a| {
                a.acknowledge("analyst@example.com", Utc::now());
                Ok(())
            })
            .unwrap();

        let replacement = store.append_alert_if_absent(tx.id, AlertType::HighAmount, || {
            Alert::new(
                &tx,
                AlertType::HighAmount,
                AlertSeverity::Medium,
                "amount again".into(),
                Utc::now(),
            )
        });
        assert!(replacement.is_some());
    }

    #[test]
    fn test_missing_entities_are_not_found() {
        let store = Store::new();
        assert!(matches!(
            store.transaction(Uuid::new_v4()),
            Err(FraudError::NotFound { .. })
        ));
        assert!(matches!(
            store.case(Uuid::new_v4()),
            Err(FraudError::NotFound { .. })
        ));
        assert!(matches!(
            store.alert(Uuid::new_v4()),
            Err(FraudError::NotFound { .. })
        ));
    }
}
