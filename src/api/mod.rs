//! REST API surface.
//!
//! Thin axum handlers over the detection, lifecycle and query services.
//! Every route except `/health` requires a bearer token; the resolved
//! actor travels in request extensions.

pub mod alerts;
pub mod cases;
pub mod statistics;
pub mod transactions;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::TokenAuthenticator;
use crate::detection::DetectionService;
use crate::error::FraudError;
use crate::lifecycle::CaseLifecycleEngine;
use crate::query::QueryService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub detection: Arc<DetectionService>,
    pub lifecycle: Arc<CaseLifecycleEngine>,
    pub query: Arc<QueryService>,
    pub auth: Arc<TokenAuthenticator>,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/transactions/",
            get(transactions::list).post(transactions::submit),
        )
        .route("/transactions/flagged/", get(transactions::flagged))
        .route("/transactions/high_risk/", get(transactions::high_risk))
        .route("/transactions/:id/", get(transactions::detail))
        .route("/transactions/:id/approve/", post(transactions::approve))
        .route("/transactions/:id/reject/", post(transactions::reject))
        .route("/cases/", get(cases::list).post(cases::create))
        .route("/cases/:id/", get(cases::detail))
        .route("/cases/:id/assign/", post(cases::assign))
        .route("/cases/:id/update_status/", post(cases::update_status))
        .route("/cases/:id/add_note/", post(cases::add_note))
        .route("/alerts/", get(alerts::list))
        .route("/alerts/unacknowledged/", get(alerts::unacknowledged))
        .route("/alerts/:id/acknowledge/", post(alerts::acknowledge))
        .route("/statistics/dashboard/", get(statistics::dashboard))
        .route("/statistics/trends/", get(statistics::trends))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the bearer token and stash the actor in request extensions.
async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, FraudError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let actor = state.auth.authenticate(header)?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::config::{ActorConfig, AppConfig, AuthConfig};
    use crate::rules::AlertGenerator;
    use crate::scoring::HeuristicScorer;
    use crate::store::Store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(Store::new());
        let config = AppConfig::default();
        let detection = Arc::new(DetectionService::new(
            store.clone(),
            Arc::new(HeuristicScorer),
            AlertGenerator::new(config.rules),
            config.detection,
            config.scoring,
        ));
        let mut tokens = HashMap::new();
        tokens.insert(
            "analyst-token".to_string(),
            ActorConfig {
                id: "analyst@example.com".to_string(),
                role: Role::Analyst,
            },
        );
        tokens.insert(
            "viewer-token".to_string(),
            ActorConfig {
                id: "viewer@example.com".to_string(),
                role: Role::Viewer,
            },
        );
        router(AppState {
            detection,
            lifecycle: Arc::new(CaseLifecycleEngine::new(store.clone())),
            query: Arc::new(QueryService::new(store)),
            auth: Arc::new(TokenAuthenticator::from_config(&AuthConfig { tokens })),
        })
    }

    fn submit_request(token: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/transactions/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_id":"user-1","amount":"25.00"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn test_viewer_cannot_submit_transactions() {
        let response = app().oneshot(submit_request("viewer-token")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_analyst_can_submit_transactions() {
        let response = app().oneshot(submit_request("analyst-token")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_viewer_can_read_listings() {
        let request = Request::builder()
            .method("GET")
            .uri("/transactions/")
            .header(header::AUTHORIZATION, "Bearer viewer-token")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let request = Request::builder()
            .method("GET")
            .uri("/transactions/")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
