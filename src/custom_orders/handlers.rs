//! HTTP handlers for custom orders

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::service::{AdvanceRequest, CreateCustomOrderRequest, RespondRequest};
use crate::core::{AppResult, Caller, IdPath, Validated};
use crate::model::CustomOrder;
use crate::payment::{ProviderOrder, VerifyRequest};
use crate::server::AppState;

/// POST /api/custom-orders
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<CreateCustomOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let order = state.custom_orders.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/custom-orders/mine
pub async fn mine(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<CustomOrder>>> {
    Ok(Json(state.custom_orders.mine(&caller).await?))
}

/// GET /api/custom-orders/restaurant
pub async fn for_restaurant(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<CustomOrder>>> {
    Ok(Json(state.custom_orders.for_restaurant(&caller).await?))
}

/// GET /api/custom-orders/{id}
pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
) -> AppResult<Json<CustomOrder>> {
    Ok(Json(state.custom_orders.get(&caller, id).await?))
}

/// PUT /api/custom-orders/{id}/respond
pub async fn respond(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
    Validated(request): Validated<RespondRequest>,
) -> AppResult<Json<CustomOrder>> {
    Ok(Json(state.custom_orders.respond(&caller, id, request).await?))
}

/// PUT /api/custom-orders/{id}/status
pub async fn advance(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
    Validated(request): Validated<AdvanceRequest>,
) -> AppResult<Json<CustomOrder>> {
    Ok(Json(state.custom_orders.advance(&caller, id, request).await?))
}

/// POST /api/custom-orders/{id}/payment
pub async fn create_payment(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
) -> AppResult<Json<ProviderOrder>> {
    Ok(Json(state.custom_orders.create_payment(&caller, id).await?))
}

/// POST /api/custom-orders/{id}/payment/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
    Validated(request): Validated<VerifyRequest>,
) -> AppResult<Json<CustomOrder>> {
    Ok(Json(
        state
            .custom_orders
            .verify_payment(&caller, id, request)
            .await?,
    ))
}
