//! Shared application state handed to every handler
//!
//! All services are cheap to clone: each holds `Arc` handles into the same
//! storage backend.

use axum::extract::FromRef;
use std::sync::Arc;

use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::core::AuthProvider;
use crate::custom_orders::CustomOrderService;
use crate::orders::{OrderEngine, OrderService, OrderWorkflow, Reconciler};
use crate::payment::{PaymentBridge, PaymentProvider};
use crate::storage::Storage;
use crate::users::UserDirectory;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Storage,
    pub auth: Arc<dyn AuthProvider>,
    pub engine: OrderEngine,
    pub workflow: OrderWorkflow,
    pub orders: OrderService,
    pub reconciler: Reconciler,
    pub payments: PaymentBridge,
    pub catalog: CatalogService,
    pub cart: CartService,
    pub custom_orders: CustomOrderService,
    pub users: UserDirectory,
}

impl AppState {
    /// Wire every service over one storage backend
    pub fn new(
        config: AppConfig,
        storage: Storage,
        auth: Arc<dyn AuthProvider>,
        payment_provider: Arc<dyn PaymentProvider>,
        engine: OrderEngine,
    ) -> Self {
        let payments = PaymentBridge::new(
            payment_provider,
            config.payment.key_secret.clone(),
            config.payment.currency.clone(),
            storage.clone(),
        );
        Self {
            workflow: OrderWorkflow::new(storage.clone()),
            orders: OrderService::new(storage.clone()),
            reconciler: Reconciler::new(storage.clone()),
            catalog: CatalogService::new(storage.clone()),
            cart: CartService::new(storage.clone()),
            custom_orders: CustomOrderService::new(
                storage.clone(),
                engine.clone(),
                payments.clone(),
            ),
            users: UserDirectory::new(storage.clone()),
            config: Arc::new(config),
            storage,
            auth,
            engine,
            payments,
        }
    }
}

impl FromRef<AppState> for Arc<dyn AuthProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
