//! Catalog: restaurants and their menus

pub mod handlers;
pub mod service;

pub use service::{CatalogService, NewDishRequest, RestaurantRequest, UpdateDishRequest};
