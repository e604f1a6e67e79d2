//! Fraud Case Service - Main Entry Point
//!
//! Serves the fraud investigation REST API: transaction intake and scoring,
//! alert generation, case lifecycle management and dashboard statistics.

use anyhow::Result;
use fraud_case_service::api::{self, AppState};
use fraud_case_service::auth::TokenAuthenticator;
use fraud_case_service::config::AppConfig;
use fraud_case_service::detection::DetectionService;
use fraud_case_service::lifecycle::CaseLifecycleEngine;
use fraud_case_service::query::QueryService;
use fraud_case_service::rules::AlertGenerator;
use fraud_case_service::scoring::{FraudScorer, HeuristicScorer, HttpScorer};
use fraud_case_service::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_case_service={}", config.logging.level).parse()?);
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Fraud Case Service");
    info!(
        flag_threshold = config.detection.flag_threshold,
        reject_threshold = config.detection.reject_threshold,
        "Configuration loaded successfully"
    );

    let store = Arc::new(Store::new());

    let scorer: Arc<dyn FraudScorer> = match &config.scoring.url {
        Some(url) => {
            info!(url = %url, "Using external scoring service");
            Arc::new(HttpScorer::new(
                url.clone(),
                Duration::from_millis(config.scoring.timeout_ms),
            )?)
        }
        None => {
            info!("No scoring service configured, using heuristic scorer");
            Arc::new(HeuristicScorer)
        }
    };

    let detection = Arc::new(DetectionService::new(
        store.clone(),
        scorer,
        AlertGenerator::new(config.rules.clone()),
        config.detection.clone(),
        config.scoring.clone(),
    ));
    let lifecycle = Arc::new(CaseLifecycleEngine::new(store.clone()));
    let query = Arc::new(QueryService::new(store.clone()));
    let auth = Arc::new(TokenAuthenticator::from_config(&config.auth));
    info!(tokens = config.auth.tokens.len(), "Authentication table loaded");

    let app = api::router(AppState {
        detection,
        lifecycle,
        query,
        auth,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening for requests");

    axum::serve(listener, app).await?;

    Ok(())
}
