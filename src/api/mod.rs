//! Dashboard HTTP API
//!
//! HTTP layer for the dashboard, built with Axum.
//!
//! # Endpoints
//!
//! ## Page
//! - `GET /` - Dashboard page
//!
//! ## Figures
//! - `GET /api/v1/figures/national` - National cases with the forecast
//! - `GET /api/v1/figures/map` - Choropleth map
//! - `GET /api/v1/figures/rt-grid` - Rt per department
//!
//! ## Interaction
//! - `GET /api/v1/state/initial` - Initial state and detail chart
//! - `POST /api/v1/interact` - Apply a map event to a state
//!
//! ## Data
//! - `POST /api/v1/refresh` - Reload data (`?force=true` to always rebuild)
//! - `GET /api/v1/snapshot` - Per-department totals
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use covid_dashboard::api::{serve, ApiConfig, AppState};
//! use covid_dashboard::config::Config;
//! use covid_dashboard::service::DashboardService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let service = Arc::new(DashboardService::from_config(&config).await?);
//!     let api_config = ApiConfig::from(&config.server);
//!
//!     serve(AppState::new(service), &api_config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Figure routes
        .route("/figures/national", get(routes::figures::national))
        .route("/figures/map", get(routes::figures::map))
        .route("/figures/rt-grid", get(routes::figures::rt_grid))
        // Interaction routes
        .route("/state/initial", get(routes::interact::initial_state))
        .route("/interact", post(routes::interact::interact))
        // Data routes
        .route("/refresh", post(routes::refresh::refresh))
        .route("/snapshot", get(routes::snapshot::snapshot));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::page::index))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dashboard listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Dashboard shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use std::sync::atomic::Ordering;
    use tower::util::ServiceExt;

    async fn create_test_app() -> (Router, Arc<testing::StubSource>) {
        let (service, source) = testing::service().await;
        let state = AppState::new(service);
        (build_router(state), source)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["regions"], 3);
    }

    #[tokio::test]
    async fn test_index_page() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Evolution &amp; Model"));
    }

    #[tokio::test]
    async fn test_figure_endpoints() {
        for uri in [
            "/api/v1/figures/national",
            "/api/v1/figures/map",
            "/api/v1/figures/rt-grid",
        ] {
            let (app, _source) = create_test_app().await;
            let response = get(app, uri).await;

            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let body = body_json(response).await;
            assert!(body["data"].as_array().is_some_and(|d| !d.is_empty()), "{}", uri);
            assert!(body["layout"].is_object(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/api/v1/state/initial").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"]["region"], "Paris");
        assert_eq!(body["state"]["scope"], "region");
        assert_eq!(body["view"]["kind"], "region_cases");
    }

    #[tokio::test]
    async fn test_interact_zoom_country_in_rt_mode() {
        let (app, _source) = create_test_app().await;
        let response = post_json(
            app,
            "/api/v1/interact",
            r#"{
                "state": {"graph_mode": "rt", "region": "Rhône", "button": "rt", "scope": "region"},
                "event": {"type": "button_activated", "button": "zoom_country"}
            }"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"]["scope"], "country");
        assert_eq!(body["view"]["kind"], "country_rt");
        assert!(body["figure"]["layout"]["title"]["text"]
            .as_str()
            .unwrap()
            .starts_with("Rt - France<br>"));
    }

    #[tokio::test]
    async fn test_interact_click_without_state() {
        let (app, _source) = create_test_app().await;
        let response = post_json(
            app,
            "/api/v1/interact",
            r#"{"event": {"type": "region_clicked", "location": "Lozère"}}"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"]["region"], "Lozère");
        assert!(body["figure"]["layout"]["title"]["text"]
            .as_str()
            .unwrap()
            .starts_with("Confirmed cases - Lozère<br>"));
    }

    #[tokio::test]
    async fn test_interact_invalid_json() {
        let (app, _source) = create_test_app().await;
        let response = post_json(app, "/api/v1/interact", "not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_unchanged_then_forced() {
        let (app, _source) = create_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "unchanged");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/refresh?force=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "updated");
    }

    #[tokio::test]
    async fn test_refresh_failure_reports_error() {
        let (app, source) = create_test_app().await;
        source.fail.store(true, Ordering::SeqCst);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/refresh?force=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "REFRESH_FAILED");
        assert!(body["request_id"].is_string());

        // Previous dataset still serving
        let response = get(app, "/api/v1/snapshot").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_snapshot_rows_carry_risk() {
        let (app, _source) = create_test_app().await;
        let response = get(app, "/api/v1/snapshot").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);

        let paris = rows.iter().find(|r| r["code"] == "75").unwrap();
        assert_eq!(paris["name"], "Paris");
        assert_eq!(paris["risk"], "high");
        assert_eq!(paris["rt"], 1.5);
    }
}
