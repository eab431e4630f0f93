//! Server module: application state, route tables and the `ServerBuilder`

pub mod builder;
pub mod exposure;
pub mod router;
pub mod state;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use state::AppState;
