//! HTTP handlers for the caller's cart

use axum::{Json, extract::State};

use super::service::{AddToCartRequest, SetQuantityRequest};
use crate::core::{AppResult, Caller, Validated};
use crate::model::CartView;
use crate::server::AppState;

/// GET /api/users/cart
pub async fn get_cart(State(state): State<AppState>, caller: Caller) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart.view(&caller).await?))
}

/// POST /api/users/cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<AddToCartRequest>,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart.add(&caller, request).await?))
}

/// PUT /api/users/cart
pub async fn update_cart(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<SetQuantityRequest>,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart.set_quantity(&caller, request).await?))
}

/// DELETE /api/users/cart
pub async fn clear_cart(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<CartView>> {
    Ok(Json(state.cart.clear(&caller).await?))
}
