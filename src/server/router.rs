//! Route tables, one per resource area
//!
//! Static segments (`/profile`, `/myorders`) take precedence over the `{id}`
//! captures next to them.

use axum::{
    Router,
    routing::{get, post, put},
};

use super::state::AppState;
use crate::{cart, catalog, custom_orders, orders, payment, users};

/// /api/users and the caller's cart
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(users::handlers::register).get(users::handlers::list))
        .route(
            "/api/users/profile",
            get(users::handlers::profile).put(users::handlers::update_profile),
        )
        .route("/api/users/stats", get(users::handlers::stats))
        .route(
            "/api/users/cart",
            get(cart::handlers::get_cart)
                .post(cart::handlers::add_to_cart)
                .put(cart::handlers::update_cart)
                .delete(cart::handlers::clear_cart),
        )
        .route("/api/users/{id}", axum::routing::delete(users::handlers::delete))
}

/// /api/restaurants and /api/dishes
pub fn catalog_routes() -> Router<AppState> {
    use catalog::handlers as h;

    Router::new()
        .route("/api/restaurants", get(h::list_restaurants).post(h::create_restaurant))
        .route("/api/restaurants/profile", get(h::profile).put(h::update_profile))
        .route("/api/restaurants/menu", get(h::menu).post(h::add_dish))
        .route(
            "/api/restaurants/menu/{id}",
            put(h::update_dish).delete(h::delete_dish),
        )
        .route("/api/restaurants/orders", get(h::restaurant_orders))
        .route(
            "/api/restaurants/orders/report/completed",
            get(h::completed_report),
        )
        .route("/api/restaurants/{id}", get(h::get_restaurant))
        .route("/api/restaurants/{id}/dishes", get(h::restaurant_dishes))
        .route("/api/dishes/random", get(h::random_dishes))
}

/// /api/orders and the admin reconciliation trigger
pub fn order_routes() -> Router<AppState> {
    use orders::handlers as h;

    Router::new()
        .route("/api/orders", post(h::place_order))
        .route("/api/orders/myorders", get(h::my_orders))
        .route("/api/orders/deliverypartner", get(h::partner_orders))
        .route("/api/orders/all", get(h::all_orders))
        .route("/api/orders/{id}", get(h::get_order))
        .route("/api/orders/{id}/status", put(h::update_status))
        .route("/api/admin/reconcile-stats", post(h::reconcile_stats))
}

/// /api/payment
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/payment/razorpay/order",
            post(payment::handlers::create_charge),
        )
        .route(
            "/api/payment/razorpay/verify",
            post(payment::handlers::verify_payment),
        )
}

/// /api/custom-orders
pub fn custom_order_routes() -> Router<AppState> {
    use custom_orders::handlers as h;

    Router::new()
        .route("/api/custom-orders", post(h::create))
        .route("/api/custom-orders/mine", get(h::mine))
        .route("/api/custom-orders/restaurant", get(h::for_restaurant))
        .route("/api/custom-orders/{id}", get(h::get))
        .route("/api/custom-orders/{id}/respond", put(h::respond))
        .route("/api/custom-orders/{id}/status", put(h::advance))
        .route("/api/custom-orders/{id}/payment", post(h::create_payment))
        .route(
            "/api/custom-orders/{id}/payment/verify",
            post(h::verify_payment),
        )
}
