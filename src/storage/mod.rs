//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

pub use in_memory::InMemoryStore;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::{CartStore, CatalogStore, CustomOrderStore, OrderStore, UserStore};
use anyhow::Result;
use std::sync::Arc;

/// Handles to every collection, shared by the services
///
/// Fields are public so a single collection can be swapped, e.g. to wrap the
/// order store in tests.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub custom_orders: Arc<dyn CustomOrderStore>,
}

impl Storage {
    /// Use one backend for every collection
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserStore + CatalogStore + CartStore + OrderStore + CustomOrderStore + Clone + 'static,
    {
        Self {
            users: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
            carts: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            custom_orders: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }

    /// Build the backend selected by configuration
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::InMemory => {
                tracing::info!("using in-memory storage");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "mongodb_backend")]
            StorageBackend::Mongodb => {
                let store =
                    MongoStore::connect(&config.uri, &config.database, config.transactions)
                        .await?;
                Ok(Self::from_store(store))
            }
            #[cfg(not(feature = "mongodb_backend"))]
            StorageBackend::Mongodb => Err(anyhow::anyhow!(
                "storage backend 'mongodb' requires the `mongodb_backend` feature"
            )),
        }
    }
}
