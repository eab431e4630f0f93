//! Integration tests for the MongoDB storage backend
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a MongoDB container)
//! - Feature flag `mongodb_backend` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features mongodb_backend --test mongodb_tests -- --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single MongoDB container (via `OnceLock`). Each test
//! gets its own database.

#![cfg(feature = "mongodb_backend")]

mod harness;

use axum::http::StatusCode;
use futures::future::join_all;
use harness::*;
use mongodb::Client;
use mongodb::bson::{Bson, Document, doc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use uuid::Uuid;

use feasthub::core::{CartStore, CatalogStore, OrderStore, Outcome, Placement, UserStore};
use feasthub::model::{Dish, Order, OrderStatus, Restaurant, RestaurantProfile, Role, User};
use feasthub::storage::{MongoStore, Storage};

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh database per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
struct MongoTestEnv {
    _container: testcontainers::ContainerAsync<Mongo>,
    connection_url: String,
}

static TEST_ENV: OnceLock<MongoTestEnv> = OnceLock::new();

async fn init_mongo_env() -> &'static MongoTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Mongo::default()
        .start()
        .await
        .expect("Failed to start MongoDB container (is Docker running?)");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(27017).await.unwrap();
    let url = format!("mongodb://{}:{}", host, port);

    let env = MongoTestEnv {
        _container: container,
        connection_url: url,
    };

    let _ = TEST_ENV.set(env);
    TEST_ENV.get().unwrap()
}

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A store over a database no other test uses
async fn mongo_store() -> MongoStore {
    let env = init_mongo_env().await;
    let client = Client::with_uri_str(&env.connection_url)
        .await
        .expect("Failed to connect to MongoDB");
    let db_num = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let store = MongoStore::new(client.database(&format!("feasthub_test_{}", db_num)), false);
    store.ensure_indexes().await.expect("indexes");
    store
}

async fn seeded(store: &MongoStore) -> (Restaurant, Dish) {
    let restaurant = Restaurant::new(
        Uuid::new_v4(),
        RestaurantProfile {
            name: Some("Spice Route".to_string()),
            ..Default::default()
        },
    );
    let restaurant = match store.create_restaurant(restaurant).await.unwrap() {
        Outcome::Done(r) => r,
        other => panic!("unexpected outcome: {:?}", other),
    };
    let dish = store
        .create_dish(Dish::new(restaurant.id, "Thali".to_string(), dec(120)))
        .await
        .unwrap();
    (restaurant, dish)
}

fn order_for(restaurant: Uuid, code: &str, total: Decimal) -> Order {
    serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "orderCode": code,
        "user": Uuid::new_v4(),
        "restaurant": restaurant,
        "totalPrice": total,
        "paymentMethod": "cod",
        "paymentStatus": "Pending",
        "orderStatus": "pending",
        "statsApplied": false,
        "createdAt": chrono::Utc::now(),
        "updatedAt": chrono::Utc::now()
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Store-level behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_place_updates_restaurant_counters() {
    let store = mongo_store().await;
    let (restaurant, _) = seeded(&store).await;

    match store.place(order_for(restaurant.id, "AAAAA1", dec(250))).await.unwrap() {
        Placement::Placed(order) => assert!(order.stats_applied),
        other => panic!("unexpected placement: {:?}", other),
    }

    let stats = store.get_restaurant(&restaurant.id).await.unwrap().unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, dec(250));
}

#[tokio::test]
async fn test_revenue_is_stored_as_exact_decimal() {
    let store = mongo_store().await;
    let (restaurant, _) = seeded(&store).await;

    store
        .place(order_for(restaurant.id, "CENT10", Decimal::new(10, 2)))
        .await
        .unwrap();
    store
        .place(order_for(restaurant.id, "CENT20", Decimal::new(20, 2)))
        .await
        .unwrap();

    let stats = store.get_restaurant(&restaurant.id).await.unwrap().unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_revenue, Decimal::new(30, 2));

    let raw = store
        .database()
        .collection::<Document>("restaurants")
        .find_one(doc! { "_id": restaurant.id.to_string() })
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(raw.get("totalRevenue"), Some(Bson::Decimal128(_))));
}

#[tokio::test]
async fn test_duplicate_code_is_reported() {
    let store = mongo_store().await;
    let (restaurant, _) = seeded(&store).await;

    store.place(order_for(restaurant.id, "SAME01", dec(100))).await.unwrap();
    let again = store.place(order_for(restaurant.id, "SAME01", dec(100))).await.unwrap();
    assert!(matches!(again, Placement::CodeTaken));

    let stats = store.get_restaurant(&restaurant.id).await.unwrap().unwrap();
    assert_eq!(stats.total_orders, 1);
}

#[tokio::test]
async fn test_missing_restaurant_is_reported() {
    let store = mongo_store().await;
    let placement = store
        .place(order_for(Uuid::new_v4(), "NOREST", dec(100)))
        .await
        .unwrap();
    assert!(matches!(placement, Placement::RestaurantMissing));
}

#[tokio::test]
async fn test_transition_is_compare_and_set() {
    let store = mongo_store().await;
    let (restaurant, _) = seeded(&store).await;
    let order = match store.place(order_for(restaurant.id, "CAS001", dec(100))).await.unwrap() {
        Placement::Placed(order) => order,
        other => panic!("unexpected placement: {:?}", other),
    };

    let moved = OrderStore::transition(
        &store,
        &order.id,
        OrderStatus::Pending,
        OrderStatus::Preparing,
        None,
    )
    .await
    .unwrap();
    assert_eq!(moved.unwrap().order_status, OrderStatus::Preparing);

    let stale = OrderStore::transition(
        &store,
        &order.id,
        OrderStatus::Pending,
        OrderStatus::Cancelled,
        None,
    )
    .await
    .unwrap();
    assert!(stale.is_none());
}

#[tokio::test]
async fn test_apply_stats_claims_once() {
    let store = mongo_store().await;
    let (restaurant, _) = seeded(&store).await;
    let order = match store.place(order_for(restaurant.id, "ONCE01", dec(80))).await.unwrap() {
        Placement::Placed(order) => order,
        other => panic!("unexpected placement: {:?}", other),
    };

    assert!(!OrderStore::apply_stats(&store, &order.id).await.unwrap());
    assert!(OrderStore::unapplied_stats(&store).await.unwrap().is_empty());
    let stats = store.get_restaurant(&restaurant.id).await.unwrap().unwrap();
    assert_eq!(stats.total_orders, 1);
}

#[tokio::test]
async fn test_unique_email() {
    let store = mongo_store().await;
    let first = User::new("Asha".to_string(), "asha@example.com", None, Role::Customer);
    let second = User::new("Other".to_string(), "ASHA@example.com", None, Role::Customer);

    assert!(matches!(
        UserStore::create(&store, first).await.unwrap(),
        Outcome::Done(_)
    ));
    assert!(matches!(
        UserStore::create(&store, second).await.unwrap(),
        Outcome::Duplicate
    ));
}

#[tokio::test]
async fn test_cart_lines_merge() {
    let store = mongo_store().await;
    let (_, dish) = seeded(&store).await;
    let user = Uuid::new_v4();

    store.add_item(&user, &dish.id, 2).await.unwrap();
    let lines = store.add_item(&user, &dish.id, 3).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);

    let lines = store
        .set_quantity(&user, &lines[0].id, 0)
        .await
        .unwrap()
        .unwrap();
    assert!(lines.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_merge_into_one_line() {
    let store = mongo_store().await;
    let (_, dish) = seeded(&store).await;
    let user = Uuid::new_v4();

    let adds = (0..8).map(|_| {
        let store = store.clone();
        let dish = dish.id;
        tokio::spawn(async move { store.add_item(&user, &dish, 2).await })
    });
    for added in join_all(adds).await {
        added.unwrap().unwrap();
    }

    let lines = CartStore::lines(&store, &user).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 16);
}

// ---------------------------------------------------------------------------
// Through the router
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_order_flow_over_http() {
    let store = mongo_store().await;
    let h = harness_with_storage(Storage::from_store(store));
    let (owner, restaurant) = h.seed_restaurant("Spice Route").await;
    let dish = h.seed_dish(&restaurant, "Thali", 150).await;
    let customer = Actor::customer();

    let response = h
        .server
        .post("/api/orders")
        .as_actor(&customer)
        .json(&json!({
            "orderItems": [{ "dish": dish.id, "qty": 2 }],
            "paymentMethod": "cod"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let order: Value = response.json();
    assert_eq!(money(&order["totalPrice"]), dec(300));

    h.server
        .put(&format!("/api/orders/{}/status", order["id"].as_str().unwrap()))
        .as_actor(&owner)
        .json(&json!({ "orderStatus": "preparing" }))
        .await
        .assert_status_ok();

    let stats = h.restaurant(restaurant.id).await;
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, dec(300));
}
