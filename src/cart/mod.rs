//! Shopping carts

pub mod handlers;
pub mod service;

pub use service::{AddToCartRequest, CartService, SetQuantityRequest};
