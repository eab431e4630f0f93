//! Cart endpoints

mod harness;

use axum::http::StatusCode;
use futures::future::join_all;
use harness::*;
use serde_json::{Value, json};
use uuid::Uuid;

use feasthub::cart::{AddToCartRequest, CartService};
use feasthub::core::Caller;
use feasthub::model::Role;
use feasthub::storage::Storage;

#[tokio::test]
async fn test_add_merges_lines_for_the_same_dish() {
    let h = harness();
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;
    let customer = Actor::customer();

    for quantity in [2, 3] {
        h.server
            .post("/api/users/cart")
            .as_actor(&customer)
            .json(&json!({ "dishId": dish.id, "quantity": quantity }))
            .await
            .assert_status_ok();
    }

    let cart: Value = h.server.get("/api/users/cart").as_actor(&customer).await.json();
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["dish"]["name"], "Idli");
    assert_eq!(cart["user"], customer.id.to_string());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_merge_into_one_line() {
    let storage = Storage::in_memory();
    let h = harness_with_storage(storage.clone());
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;
    let customer = Actor::customer();
    let cart = CartService::new(storage);

    let adds = (0..16).map(|_| {
        let cart = cart.clone();
        let caller = Caller {
            user_id: customer.id,
            role: Role::Customer,
        };
        let dish_id = dish.id;
        tokio::spawn(async move {
            cart.add(&caller, AddToCartRequest { dish_id, quantity: 1 }).await
        })
    });
    for added in join_all(adds).await {
        added.unwrap().unwrap();
    }

    let view: Value = h.server.get("/api/users/cart").as_actor(&customer).await.json();
    let items = view["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 16);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let h = harness();
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;

    h.server
        .post("/api/users/cart")
        .as_actor(&Actor::customer())
        .json(&json!({ "dish": dish.id, "quantity": 1 }))
        .await
        .assert_status_ok();

    let other: Value = h
        .server
        .get("/api/users/cart")
        .as_actor(&Actor::customer())
        .await
        .json();
    assert!(other["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_dish_is_not_found() {
    let h = harness();
    let response = h
        .server
        .post("/api/users/cart")
        .as_actor(&Actor::customer())
        .json(&json!({ "dishId": Uuid::new_v4(), "quantity": 1 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_quantity_add_is_rejected() {
    let h = harness();
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;

    let response = h
        .server
        .post("/api/users/cart")
        .as_actor(&Actor::customer())
        .json(&json!({ "dishId": dish.id, "quantity": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_quantity_and_remove_line() {
    let h = harness();
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let idli = h.seed_dish(&restaurant, "Idli", 40).await;
    let vada = h.seed_dish(&restaurant, "Vada", 30).await;
    let customer = Actor::customer();

    for dish in [&idli, &vada] {
        h.server
            .post("/api/users/cart")
            .as_actor(&customer)
            .json(&json!({ "dishId": dish.id, "quantity": 1 }))
            .await
            .assert_status_ok();
    }
    let cart: Value = h.server.get("/api/users/cart").as_actor(&customer).await.json();
    let line_id = cart["items"][0]["id"].clone();

    let cart: Value = h
        .server
        .put("/api/users/cart")
        .as_actor(&customer)
        .json(&json!({ "dishId": line_id, "quantity": 7 }))
        .await
        .json();
    assert_eq!(cart["items"][0]["quantity"], 7);

    let cart: Value = h
        .server
        .put("/api/users/cart")
        .as_actor(&customer)
        .json(&json!({ "dishId": line_id, "quantity": 0 }))
        .await
        .json();
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["dish"]["name"], "Vada");
}

#[tokio::test]
async fn test_set_quantity_on_unknown_line_is_not_found() {
    let h = harness();
    let response = h
        .server
        .put("/api/users/cart")
        .as_actor(&Actor::customer())
        .json(&json!({ "dishId": Uuid::new_v4(), "quantity": 2 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_empties_the_cart() {
    let h = harness();
    let (_, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;
    let customer = Actor::customer();

    h.server
        .post("/api/users/cart")
        .as_actor(&customer)
        .json(&json!({ "dishId": dish.id, "quantity": 2 }))
        .await
        .assert_status_ok();

    let cleared: Value = h.server.delete("/api/users/cart").as_actor(&customer).await.json();
    assert!(cleared["items"].as_array().unwrap().is_empty());

    let cart: Value = h.server.get("/api/users/cart").as_actor(&customer).await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_dish_drops_out_of_the_view() {
    let h = harness();
    let (owner, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Idli", 40).await;
    let customer = Actor::customer();

    h.server
        .post("/api/users/cart")
        .as_actor(&customer)
        .json(&json!({ "dishId": dish.id, "quantity": 2 }))
        .await
        .assert_status_ok();

    h.server
        .delete(&format!("/api/restaurants/menu/{}", dish.id))
        .as_actor(&owner)
        .await
        .assert_status_success();

    let cart: Value = h.server.get("/api/users/cart").as_actor(&customer).await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_requires_identity() {
    let h = harness();
    h.server
        .get("/api/users/cart")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
