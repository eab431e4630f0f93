//! Core module containing the traits and types shared by every layer

pub mod auth;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod service;
pub mod validation;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, Caller, HeaderAuthProvider};
pub use entity::Entity;
pub use error::{AppError, AppResult};
pub use extractors::IdPath;
pub use service::{
    CartStore, CatalogStore, CustomOrderStore, OrderStore, Outcome, Placement, UserStore,
};
pub use validation::Validated;
