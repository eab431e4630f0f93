//! Payment provider clients
//!
//! Only "create a charge" is needed from the provider. Confirmation happens
//! locally by checking the HMAC signature the provider hands to the client
//! (see [`super::signature`]).

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PaymentConfig;
use crate::core::error::UpstreamError;

/// A charge created on the provider side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    /// Amount in minor units (paise for INR)
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a charge for `amount` (major units) in `currency`
    async fn create_charge(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<ProviderOrder, UpstreamError>;
}

/// Major units to minor units, rounded to the nearest minor unit
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount.checked_mul(Decimal::ONE_HUNDRED)?.round().to_i64()
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

/// Razorpay orders API over HTTPS
pub struct RazorpayProvider {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayProvider {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build payment HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }
}

#[async_trait]
impl PaymentProvider for RazorpayProvider {
    async fn create_charge(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<ProviderOrder, UpstreamError> {
        let minor = to_minor_units(amount).ok_or_else(|| UpstreamError::PaymentProvider {
            message: format!("amount {} out of range", amount),
        })?;
        let body = CreateOrderBody {
            amount: minor,
            currency,
            receipt: format!("receipt_order_{}", chrono::Utc::now().timestamp_millis()),
        };

        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::PaymentProvider {
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UpstreamError::PaymentProvider {
                message: format!("provider answered {}: {}", status, detail),
            });
        }

        let order: ProviderOrder =
            response
                .json()
                .await
                .map_err(|e| UpstreamError::PaymentProvider {
                    message: format!("unreadable provider response: {}", e),
                })?;
        tracing::info!(provider_order = %order.id, amount = order.amount, "payment charge created");
        Ok(order)
    }
}

/// Used when no provider credentials are configured
pub struct DisabledProvider;

#[async_trait]
impl PaymentProvider for DisabledProvider {
    async fn create_charge(&self, _: Decimal, _: &str) -> Result<ProviderOrder, UpstreamError> {
        Err(UpstreamError::NotConfigured)
    }
}

/// Razorpay when both key id and secret are configured, otherwise disabled
pub fn provider_from_config(
    config: &PaymentConfig,
) -> anyhow::Result<std::sync::Arc<dyn PaymentProvider>> {
    match (&config.key_id, &config.key_secret) {
        (Some(key_id), Some(secret)) => Ok(std::sync::Arc::new(RazorpayProvider::new(
            config.base_url.clone(),
            key_id.clone(),
            secret.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        _ => {
            tracing::warn!("payment provider credentials missing, charges are disabled");
            Ok(std::sync::Arc::new(DisabledProvider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(200, 0)), Some(20000));
        assert_eq!(to_minor_units(Decimal::new(19999, 2)), Some(19999));
        assert_eq!(to_minor_units(Decimal::new(12345, 3)), Some(1235));
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }

    #[tokio::test]
    async fn test_disabled_provider() {
        let err = DisabledProvider
            .create_charge(Decimal::ONE, "INR")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured));
    }
}
