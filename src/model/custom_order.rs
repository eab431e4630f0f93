//! Bespoke recipe requests negotiated with a restaurant

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{DeliveryAddress, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomOrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl CustomOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomOrderStatus::Pending => "pending",
            CustomOrderStatus::Accepted => "accepted",
            CustomOrderStatus::Rejected => "rejected",
            CustomOrderStatus::InProgress => "in-progress",
            CustomOrderStatus::Completed => "completed",
        }
    }

    /// Payment is possible once the restaurant has accepted
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            CustomOrderStatus::Accepted
                | CustomOrderStatus::InProgress
                | CustomOrderStatus::Completed
        )
    }
}

impl fmt::Display for CustomOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomOrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CustomOrderStatus::Pending),
            "accepted" => Ok(CustomOrderStatus::Accepted),
            "rejected" => Ok(CustomOrderStatus::Rejected),
            "in-progress" => Ok(CustomOrderStatus::InProgress),
            "completed" => Ok(CustomOrderStatus::Completed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOrder {
    pub id: Uuid,
    pub user: Uuid,
    pub restaurant: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub servings: u32,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    /// Zero until the restaurant accepts
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_note: Option<String>,
    pub status: CustomOrderStatus,
    pub payment_status: PaymentStatus,
    /// Provider charge id this custom order may be paid with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
    /// Regular order created once the payment was confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(CustomOrder, "custom_orders", "custom order");

impl CustomOrder {
    pub fn new(
        user: Uuid,
        restaurant: Uuid,
        title: String,
        description: String,
        ingredients: Vec<String>,
        servings: u32,
        delivery_address: DeliveryAddress,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            restaurant,
            title,
            description,
            ingredients,
            servings,
            delivery_address,
            price: Decimal::ZERO,
            restaurant_note: None,
            status: CustomOrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_ref: None,
            order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// Compare-and-set update applied by the store
#[derive(Debug, Clone)]
pub struct CustomOrderUpdate {
    pub expected: CustomOrderStatus,
    pub status: CustomOrderStatus,
    pub price: Option<Decimal>,
    pub restaurant_note: Option<String>,
}
