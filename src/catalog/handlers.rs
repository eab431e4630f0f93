//! HTTP handlers for restaurants and dishes

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::service::{NewDishRequest, RestaurantRequest, UpdateDishRequest};
use crate::core::{AppResult, Caller, IdPath, Validated};
use crate::model::{CompletedOrdersReport, Dish, Order, Restaurant};
use crate::server::AppState;

/// GET /api/restaurants
pub async fn list_restaurants(State(state): State<AppState>) -> AppResult<Json<Vec<Restaurant>>> {
    Ok(Json(state.catalog.restaurants().await?))
}

/// GET /api/restaurants/{id}
pub async fn get_restaurant(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Restaurant>> {
    Ok(Json(state.catalog.restaurant(id).await?))
}

/// GET /api/restaurants/{id}/dishes
pub async fn restaurant_dishes(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<Vec<Dish>>> {
    Ok(Json(state.catalog.restaurant_dishes(id).await?))
}

/// GET /api/dishes/random
pub async fn random_dishes(State(state): State<AppState>) -> AppResult<Json<Vec<Dish>>> {
    Ok(Json(state.catalog.random_dishes().await?))
}

/// POST /api/restaurants
pub async fn create_restaurant(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<RestaurantRequest>,
) -> AppResult<impl IntoResponse> {
    let restaurant = state.catalog.create_restaurant(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// GET /api/restaurants/profile
pub async fn profile(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Restaurant>> {
    Ok(Json(state.catalog.own_restaurant(&caller).await?))
}

/// PUT /api/restaurants/profile
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<RestaurantRequest>,
) -> AppResult<Json<Restaurant>> {
    Ok(Json(state.catalog.update_profile(&caller, request).await?))
}

/// GET /api/restaurants/menu
pub async fn menu(State(state): State<AppState>, caller: Caller) -> AppResult<Json<Vec<Dish>>> {
    Ok(Json(state.catalog.menu(&caller).await?))
}

/// POST /api/restaurants/menu
pub async fn add_dish(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<NewDishRequest>,
) -> AppResult<impl IntoResponse> {
    let dish = state.catalog.add_dish(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

/// PUT /api/restaurants/menu/{id}
pub async fn update_dish(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
    Validated(request): Validated<UpdateDishRequest>,
) -> AppResult<Json<Dish>> {
    Ok(Json(state.catalog.update_dish(&caller, id, request).await?))
}

/// DELETE /api/restaurants/menu/{id}
pub async fn delete_dish(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
) -> AppResult<StatusCode> {
    state.catalog.delete_dish(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/restaurants/orders
pub async fn restaurant_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.restaurant_orders(&caller).await?))
}

/// GET /api/restaurants/orders/report/completed
pub async fn completed_report(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<CompletedOrdersReport>> {
    Ok(Json(state.orders.completed_report(&caller).await?))
}
