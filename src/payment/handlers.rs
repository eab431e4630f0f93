//! HTTP handlers for the payment bridge

use axum::{Json, extract::State};
use serde::Serialize;

use super::provider::ProviderOrder;
use super::service::{ChargeRequest, VerifyRequest};
use crate::core::{AppResult, Caller, Validated};
use crate::model::Order;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

/// POST /api/payment/razorpay/order
pub async fn create_charge(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<ChargeRequest>,
) -> AppResult<Json<ProviderOrder>> {
    let charge = state.payments.charge(&caller, &request).await?;
    Ok(Json(charge))
}

/// POST /api/payment/razorpay/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    Validated(request): Validated<VerifyRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let order = state.payments.confirm(&request).await?;
    Ok(Json(VerifyResponse {
        verified: true,
        order,
    }))
}
