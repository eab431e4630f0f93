//! Payment confirmation bridge
//!
//! Creates provider charges and checks provider signatures. A verified
//! signature is the only thing that may flip an order to `Paid`.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::provider::{PaymentProvider, ProviderOrder};
use super::signature;
use crate::core::error::{AppError, AppResult, UpstreamError};
use crate::core::validation::validators::{not_blank, positive_amount};
use crate::core::Caller;
use crate::model::{Order, PaymentStatus};
use crate::storage::Storage;

/// Body of `POST /api/payment/razorpay/order`
///
/// With `orderRef` the charge is for that order's total and is remembered
/// on the order; `amount` is then ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    #[serde(default)]
    #[validate(custom(function = "positive_amount"))]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_ref: Option<Uuid>,
}

/// Payment confirmation as handed back by the provider checkout
///
/// The provider's `razorpay_*` field names are accepted as well.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(alias = "razorpay_order_id")]
    #[validate(custom(function = "not_blank"))]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    #[validate(custom(function = "not_blank"))]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    #[validate(custom(function = "not_blank"))]
    pub signature: String,
    /// Our order to mark paid once the signature checks out
    #[serde(default)]
    pub order_ref: Option<Uuid>,
}

#[derive(Clone)]
pub struct PaymentBridge {
    provider: Arc<dyn PaymentProvider>,
    key_secret: Option<String>,
    currency: String,
    storage: Storage,
}

impl PaymentBridge {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        key_secret: Option<String>,
        currency: impl Into<String>,
        storage: Storage,
    ) -> Self {
        Self {
            provider,
            key_secret,
            currency: currency.into(),
            storage,
        }
    }

    /// Create a provider charge for `amount` major units
    pub async fn create_charge(
        &self,
        amount: Decimal,
        currency: Option<&str>,
    ) -> AppResult<ProviderOrder> {
        if amount <= Decimal::ZERO {
            return Err(AppError::invalid("amount", "must be greater than zero"));
        }
        let currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.currency);
        Ok(self.provider.create_charge(amount, currency).await?)
    }

    /// Handle a charge request: a standalone amount, or the total of one of
    /// the caller's unpaid orders
    pub async fn charge(
        &self,
        caller: &Caller,
        request: &ChargeRequest,
    ) -> AppResult<ProviderOrder> {
        let currency = request.currency.as_deref();
        let Some(order_id) = request.order_ref else {
            let amount = request
                .amount
                .ok_or_else(|| AppError::invalid("amount", "amount or orderRef is required"))?;
            return self.create_charge(amount, currency).await;
        };

        let order = self
            .storage
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        if !order.is_customer(caller.user_id) {
            return Err(AppError::forbidden("not your order"));
        }
        if order.payment_status == PaymentStatus::Paid {
            return Err(AppError::invalid("paymentStatus", "order is already paid"));
        }

        let charge = self.create_charge(order.total_price, currency).await?;
        self.storage
            .orders
            .set_payment_ref(&order_id, &charge.id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        tracing::info!(
            order_id = %order_id,
            provider_order = %charge.id,
            "charge created for order"
        );
        Ok(charge)
    }

    /// Check a provider signature. Fails when no key secret is configured.
    pub fn verify(&self, order_id: &str, payment_id: &str, sig: &str) -> AppResult<bool> {
        let secret = self
            .key_secret
            .as_deref()
            .ok_or(UpstreamError::NotConfigured)?;
        Ok(signature::verify(secret, order_id, payment_id, sig))
    }

    /// Verify, rejecting a mismatch with a validation error
    pub fn require_verified(&self, request: &VerifyRequest) -> AppResult<()> {
        if self.verify(&request.order_id, &request.payment_id, &request.signature)? {
            Ok(())
        } else {
            tracing::warn!(
                provider_order = %request.order_id,
                payment = %request.payment_id,
                "payment signature rejected"
            );
            Err(AppError::invalid("signature", "payment verification failed"))
        }
    }

    /// Reject a confirmation whose provider order is not the charge recorded
    /// for our order
    pub fn require_charge(
        &self,
        payment_ref: Option<&str>,
        request: &VerifyRequest,
    ) -> AppResult<()> {
        if payment_ref == Some(request.order_id.as_str()) {
            return Ok(());
        }
        tracing::warn!(
            provider_order = %request.order_id,
            expected = ?payment_ref,
            "payment confirmation for another charge"
        );
        Err(AppError::invalid("orderId", "payment does not belong to this order"))
    }

    /// Verify the signature and mark the referenced order paid.
    /// Without an `order_ref` only the signature is checked.
    pub async fn confirm(&self, request: &VerifyRequest) -> AppResult<Option<Order>> {
        self.require_verified(request)?;

        let Some(order_id) = request.order_ref else {
            return Ok(None);
        };
        let pending = self
            .storage
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        self.require_charge(pending.payment_ref.as_deref(), request)?;

        let order = self
            .storage
            .orders
            .mark_paid(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        tracing::info!(
            order_id = %order.id,
            order_code = %order.order_code,
            payment = %request.payment_id,
            "order marked paid"
        );
        Ok(Some(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::provider::DisabledProvider;

    fn bridge(secret: Option<&str>) -> PaymentBridge {
        PaymentBridge::new(
            Arc::new(DisabledProvider),
            secret.map(str::to_string),
            "INR",
            Storage::in_memory(),
        )
    }

    fn request(signature: String, order_ref: Option<Uuid>) -> VerifyRequest {
        VerifyRequest {
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
            signature,
            order_ref,
        }
    }

    #[tokio::test]
    async fn test_charge_requires_positive_amount() {
        let err = bridge(None)
            .create_charge(Decimal::ZERO, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_charge_without_provider_is_upstream_error() {
        let err = bridge(None)
            .create_charge(Decimal::ONE, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_verify_without_secret_fails() {
        assert!(bridge(None).verify("a", "b", "00").is_err());
    }

    #[tokio::test]
    async fn test_confirm_signature_only() {
        let sig = signature::sign("secret", "order_1", "pay_1");
        let confirmed = bridge(Some("secret"))
            .confirm(&request(sig, None))
            .await
            .unwrap();
        assert!(confirmed.is_none());
    }

    #[tokio::test]
    async fn test_confirm_rejects_bad_signature() {
        let err = bridge(Some("secret"))
            .confirm(&request("00".repeat(32), None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_require_charge_matches_recorded_charge() {
        let bridge = bridge(Some("secret"));
        let sig = signature::sign("secret", "order_1", "pay_1");
        let req = request(sig, None);
        assert!(bridge.require_charge(Some("order_1"), &req).is_ok());
        let err = bridge.require_charge(Some("order_2"), &req).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(bridge.require_charge(None, &req).is_err());
    }

    #[tokio::test]
    async fn test_charge_without_amount_or_order() {
        let caller = Caller {
            user_id: Uuid::new_v4(),
            role: crate::model::Role::Customer,
        };
        let request = ChargeRequest {
            amount: None,
            currency: None,
            order_ref: None,
        };
        let err = bridge(None).charge(&caller, &request).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirm_unknown_order_ref() {
        let sig = signature::sign("secret", "order_1", "pay_1");
        let err = bridge(Some("secret"))
            .confirm(&request(sig, Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
