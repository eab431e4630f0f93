//! Payment provider bridge: charge creation and signature verification

pub mod handlers;
pub mod provider;
pub mod service;
pub mod signature;

pub use provider::{DisabledProvider, PaymentProvider, ProviderOrder, RazorpayProvider};
pub use service::{ChargeRequest, PaymentBridge, VerifyRequest};
