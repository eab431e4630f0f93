//! Shared harness for HTTP-level tests
//!
//! Builds the full router over the in-memory backend and drives it through
//! `axum_test::TestServer`. Callers are identified with the same headers the
//! upstream gateway sets.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use feasthub::config::AppConfig;
use feasthub::core::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use feasthub::core::error::UpstreamError;
use feasthub::model::{Dish, Restaurant, RestaurantProfile, Role};
use feasthub::payment::provider::to_minor_units;
use feasthub::payment::{PaymentProvider, ProviderOrder};
use feasthub::server::ServerBuilder;
use feasthub::storage::Storage;

pub const KEY_SECRET: &str = "test_key_secret";

/// An identity as seen by the router
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
        }
    }

    pub fn customer() -> Self {
        Self::new(Role::Customer)
    }

    pub fn owner() -> Self {
        Self::new(Role::Restaurant)
    }

    pub fn partner() -> Self {
        Self::new(Role::Delivery)
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }
}

/// Attach identity headers to a request
pub trait AsActor {
    fn as_actor(self, actor: &Actor) -> Self;
}

impl AsActor for TestRequest {
    fn as_actor(self, actor: &Actor) -> Self {
        self.add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&actor.id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static(actor.role.as_str()),
        )
    }
}

/// Payment provider answering every charge locally
pub struct StubProvider {
    counter: AtomicU64,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PaymentProvider for StubProvider {
    async fn create_charge(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<ProviderOrder, UpstreamError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderOrder {
            id: format!("order_stub{}", n),
            amount: to_minor_units(amount).unwrap(),
            currency: currency.to_string(),
            receipt: Some(format!("receipt_order_{}", n)),
            status: Some("created".to_string()),
        })
    }
}

pub struct Harness {
    pub server: TestServer,
    pub storage: Storage,
}

/// Router over a fresh in-memory store with a stub payment provider
pub fn harness() -> Harness {
    harness_with_storage(Storage::in_memory())
}

pub fn harness_with_storage(storage: Storage) -> Harness {
    let mut config = AppConfig::default();
    config.payment.key_id = Some("rzp_test".to_string());
    config.payment.key_secret = Some(KEY_SECRET.to_string());

    let app = ServerBuilder::new()
        .with_config(config)
        .with_storage(storage.clone())
        .with_payment_provider(StubProvider::new())
        .build()
        .expect("Failed to build app");

    Harness {
        server: TestServer::try_new(app).expect("Failed to create test server"),
        storage,
    }
}

impl Harness {
    /// Insert a restaurant owned by a fresh owner
    pub async fn seed_restaurant(&self, name: &str) -> (Actor, Restaurant) {
        let owner = Actor::owner();
        let restaurant = Restaurant::new(
            owner.id,
            RestaurantProfile {
                name: Some(name.to_string()),
                ..Default::default()
            },
        );
        let restaurant = match self
            .storage
            .catalog
            .create_restaurant(restaurant)
            .await
            .unwrap()
        {
            feasthub::core::Outcome::Done(r) => r,
            other => panic!("unexpected outcome: {:?}", other),
        };
        (owner, restaurant)
    }

    /// Insert a dish priced in whole units
    pub async fn seed_dish(&self, restaurant: &Restaurant, name: &str, price: i64) -> Dish {
        self.storage
            .catalog
            .create_dish(Dish::new(
                restaurant.id,
                name.to_string(),
                Decimal::new(price, 0),
            ))
            .await
            .unwrap()
    }

    pub async fn restaurant(&self, id: Uuid) -> Restaurant {
        self.storage
            .catalog
            .get_restaurant(&id)
            .await
            .unwrap()
            .expect("restaurant exists")
    }
}

/// A JSON number as `Decimal`, for comparing money
pub fn money(value: &serde_json::Value) -> Decimal {
    serde_json::from_value(value.clone()).expect("money value")
}

/// Shorthand for whole-unit decimals
pub fn dec(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

/// Body for a delivery address that passes validation
pub fn address() -> serde_json::Value {
    serde_json::json!({
        "street": "12 MG Road",
        "city": "Bengaluru",
        "postalCode": "560001"
    })
}
