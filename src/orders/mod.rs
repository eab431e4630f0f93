//! Orders: placement, status workflow, queries and stats reconciliation

pub mod code;
pub mod handlers;
pub mod placement;
pub mod reconcile;
pub mod service;
pub mod workflow;

pub use code::generate_order_code;
pub use placement::{BasicItemRequest, OrderEngine, OrderItemRequest, PlaceOrderRequest};
pub use reconcile::{ReconcileReport, Reconciler};
pub use service::OrderService;
pub use workflow::OrderWorkflow;
