//! Fraud Case Service Library
//!
//! Backend for fraud investigation workflows: transactions are scored for
//! risk, scores trigger alerts, alerts escalate into cases, and cases move
//! through an investigation lifecycle with notes, assignment and
//! financial-impact tracking.

pub mod api;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod lifecycle;
pub mod query;
pub mod rules;
pub mod scoring;
pub mod store;
pub mod types;

pub use auth::{Actor, Role, TokenAuthenticator};
pub use classifier::{classify, RiskLevel};
pub use config::AppConfig;
pub use detection::DetectionService;
pub use error::FraudError;
pub use lifecycle::CaseLifecycleEngine;
pub use query::QueryService;
pub use rules::AlertGenerator;
pub use store::Store;
pub use types::{Alert, CaseNote, CaseStatus, FraudCase, Transaction};
