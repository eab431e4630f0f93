//! # FeastHub
//!
//! A food-ordering REST backend: restaurants and menus, per-user carts, order
//! placement with server-side pricing, an order status workflow guarded by
//! caller roles, custom recipe requests, and payment confirmation through a
//! provider signature.
//!
//! ## Features
//!
//! - **Trusted pricing**: order totals are recomputed from catalog records,
//!   client-submitted prices are ignored
//! - **Order codes**: 6-character `[A-Z0-9]` codes, unique per order
//! - **Restaurant counters**: `totalOrders` / `totalRevenue` move exactly once
//!   per order, with reconciliation for updates that did not land
//! - **Status workflow**: compare-and-set transitions with role guards
//! - **Storage backends**: in-memory (default) and MongoDB (`mongodb_backend`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feasthub::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load()?;
//!     let storage = Storage::from_config(&config.storage).await?;
//!     let addr = config.server.addr();
//!
//!     ServerBuilder::new()
//!         .with_config(config)
//!         .with_storage(storage)
//!         .serve(&addr)
//!         .await
//! }
//! ```
//!
//! Requests identify the caller with the `X-User-Id` and `X-User-Role`
//! headers set by the upstream auth gateway.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod core;
pub mod custom_orders;
pub mod model;
pub mod orders;
pub mod payment;
pub mod server;
pub mod storage;
pub mod users;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AppError, AppResult, AuthContext, AuthPolicy, AuthProvider, Caller, HeaderAuthProvider,
        service::{CartStore, CatalogStore, CustomOrderStore, OrderStore, UserStore},
    };
    pub use crate::core::error::{
        AuthError, EntityError, FieldValidationError, IntegrityError, UpstreamError,
        ValidationError,
    };

    // === Model ===
    pub use crate::model::*;

    // === Services ===
    pub use crate::orders::{OrderEngine, OrderWorkflow, PlaceOrderRequest, Reconciler};
    pub use crate::payment::{PaymentBridge, PaymentProvider, RazorpayProvider};

    // === Storage ===
    pub use crate::storage::{InMemoryStore, Storage};
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoStore;

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
