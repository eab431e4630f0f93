//! API exposure
//!
//! The exposure consumes an [`AppState`](super::AppState) and produces a
//! router for one protocol. REST is the only one.

pub mod rest;

pub use rest::RestExposure;
