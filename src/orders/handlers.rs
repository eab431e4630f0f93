//! HTTP handlers for orders

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use super::placement::PlaceOrderRequest;
use super::reconcile::ReconcileReport;
use crate::core::validation::validators::not_blank;
use crate::core::{AppResult, Caller, IdPath, Validated};
use crate::model::Order;
use crate::server::AppState;

/// Body of `PUT /api/orders/{id}/status`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(alias = "status")]
    #[validate(custom(function = "not_blank"))]
    pub order_status: String,
}

/// POST /api/orders
pub async fn place_order(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<PlaceOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let order = state.engine.place(caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/myorders
pub async fn my_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.my_orders(&caller).await?))
}

/// GET /api/orders/deliverypartner
pub async fn partner_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.partner_board(&caller).await?))
}

/// GET /api/orders/all
pub async fn all_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.all(&caller).await?))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get(&caller, id).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
    Validated(request): Validated<StatusUpdateRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .workflow
        .update_status(&caller, id, request.order_status.trim())
        .await?;
    Ok(Json(order))
}

/// POST /api/admin/reconcile-stats
pub async fn reconcile_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<ReconcileReport>> {
    caller.require_admin()?;
    let report = state.reconciler.reconcile().await?;
    tracing::info!(?report, by = %caller.user_id, "manual stats reconciliation");
    Ok(Json(report))
}
