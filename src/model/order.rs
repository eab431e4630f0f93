//! Orders, their line-item snapshots and status values

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a regular order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "preparing")]
    Preparing,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "on-the-way")]
    OnTheWay,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OnTheWay => "on-the-way",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "on-the-way" => Ok(OrderStatus::OnTheWay),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Snapshot of a catalog dish taken when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub dish: Uuid,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub qty: u32,
}

/// Ad hoc line without a catalog dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_code: String,
    pub user: Uuid,
    pub restaurant: Uuid,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub basic_items: Vec<BasicItem>,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    pub total_price: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_partner: Option<Uuid>,
    /// Provider charge id this order may be paid with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
    /// Whether the restaurant counters include this order
    #[serde(default)]
    pub stats_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Order, "orders", "order");

impl Order {
    pub fn is_customer(&self, user: Uuid) -> bool {
        self.user == user
    }

    pub fn is_assigned_to(&self, partner: Uuid) -> bool {
        self.delivery_partner == Some(partner)
    }
}

/// Σ price × quantity over both kinds of line; `None` on overflow
pub fn order_total(items: &[OrderItem], basic: &[BasicItem]) -> Option<Decimal> {
    let dishes = items.iter().map(|item| (item.price, item.qty));
    let extras = basic.iter().map(|item| (item.price, item.quantity));
    dishes
        .chain(extras)
        .try_fold(Decimal::ZERO, |total, (price, qty)| {
            price.checked_mul(Decimal::from(qty))?.checked_add(total)
        })
}

/// Delivered orders of a restaurant with their count and revenue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrdersReport {
    pub orders: Vec<Order>,
    pub count: usize,
    pub revenue: Decimal,
}

impl CompletedOrdersReport {
    pub fn from_orders(orders: Vec<Order>) -> Self {
        let revenue = orders
            .iter()
            .fold(Decimal::ZERO, |sum, o| sum.saturating_add(o.total_price));
        Self {
            count: orders.len(),
            revenue,
            orders,
        }
    }
}
