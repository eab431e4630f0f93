//! Custom orders: requests, restaurant responses, payment and promotion

pub mod handlers;
pub mod service;

pub use service::{AdvanceRequest, CreateCustomOrderRequest, CustomOrderService, RespondRequest};
