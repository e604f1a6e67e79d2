//! Domain entities: transactions, alerts, fraud cases and notes.

pub mod alert;
pub mod case;
pub mod transaction;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use case::{CaseNote, CaseStatus, FraudCase, NewCase};
pub use transaction::{NewTransaction, Transaction, TransactionStatus};
