//! REST API exposure
//!
//! Builds the axum `Router` from the application state: health checks, every
//! `/api` route table, custom routes, request tracing and CORS.

use super::super::router::{
    catalog_routes, custom_order_routes, order_routes, payment_routes, user_routes,
};
use super::super::state::AppState;
use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router
    ///
    /// # Arguments
    ///
    /// * `state` - Services shared by every handler
    /// * `custom_routes` - Additional routes merged before the layers apply
    pub fn build_router(state: AppState, custom_routes: Vec<Router<AppState>>) -> Result<Router> {
        let mut app = Self::health_routes()
            .merge(user_routes())
            .merge(catalog_routes())
            .merge(order_routes())
            .merge(payment_routes())
            .merge(custom_order_routes());

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Ok(app
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state))
    }

    /// Build health check routes
    fn health_routes() -> Router<AppState> {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "feasthub"
        }))
    }
}
