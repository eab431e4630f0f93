//! User directory

pub mod handlers;
pub mod service;

pub use service::{RegisterRequest, UpdateProfileRequest, UserDirectory};
