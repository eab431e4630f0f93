//! Order placement engine
//!
//! Turns a client submission into a persisted order. Nothing the client says
//! about money is trusted: names, prices and images come from the catalog,
//! the total is recomputed here, and the payment status follows from the
//! payment method alone.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::code::generate_order_code;
use crate::core::error::{AppError, AppResult, IntegrityError};
use crate::core::validation::validators::{non_negative_amount, not_blank};
use crate::core::Placement;
use crate::model::{
    BasicItem, DeliveryAddress, Order, OrderItem, OrderStatus, PaymentStatus, order_total,
};
use crate::storage::Storage;

/// Payment method that leaves the order unpaid until delivery
pub const CASH_ON_DELIVERY: &str = "cod";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub dish: Uuid,
    #[serde(alias = "quantity")]
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub qty: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BasicItemRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: Decimal,
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub quantity: i64,
}

/// A client order submission
///
/// Unknown fields such as `totalPrice`, `paymentStatus` or per-item prices
/// are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    #[validate(nested)]
    pub order_items: Vec<OrderItemRequest>,
    #[serde(default)]
    #[validate(nested)]
    pub basic_items: Vec<BasicItemRequest>,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    #[validate(custom(function = "not_blank"))]
    pub payment_method: String,
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Required when there are only basic items
    #[serde(default)]
    pub restaurant: Option<Uuid>,
}

type CodeSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Validates, prices and persists orders
#[derive(Clone)]
pub struct OrderEngine {
    storage: Storage,
    code_attempts: usize,
    codes: CodeSource,
}

impl OrderEngine {
    pub fn new(storage: Storage, code_attempts: usize) -> Self {
        Self {
            storage,
            code_attempts: code_attempts.max(1),
            codes: Arc::new(generate_order_code),
        }
    }

    /// Replace the order code generator
    pub fn with_code_source(mut self, codes: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.codes = Arc::new(codes);
        self
    }

    /// Place an order for `user`
    pub async fn place(&self, user: Uuid, request: PlaceOrderRequest) -> AppResult<Order> {
        request.validate()?;
        if request.order_items.is_empty() && request.basic_items.is_empty() {
            return Err(AppError::invalid("orderItems", "no order items"));
        }

        let (order_items, restaurants): (Vec<OrderItem>, Vec<Uuid>) = self
            .resolve_items(&request.order_items)
            .await?
            .into_iter()
            .unzip();
        let restaurant = self.resolve_restaurant(&request, &restaurants).await?;
        let basic_items: Vec<BasicItem> = request
            .basic_items
            .iter()
            .map(|item| BasicItem {
                name: item.name.trim().to_string(),
                price: item.price,
                quantity: item.quantity as u32,
            })
            .collect();

        let total_price = order_total(&order_items, &basic_items)
            .ok_or_else(|| AppError::invalid("totalPrice", "order total is out of range"))?;
        let payment_status = if request.payment_method.trim() == CASH_ON_DELIVERY {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        };

        let now = Utc::now();
        let template = Order {
            id: Uuid::new_v4(),
            order_code: String::new(),
            user,
            restaurant,
            order_items,
            basic_items,
            delivery_address: request.delivery_address,
            total_price,
            payment_method: request.payment_method.trim().to_string(),
            payment_status,
            order_status: OrderStatus::Pending,
            estimated_time: request.estimated_time,
            delivery_partner: None,
            payment_ref: None,
            stats_applied: false,
            created_at: now,
            updated_at: now,
        };

        for attempt in 1..=self.code_attempts {
            let mut order = template.clone();
            order.order_code = (self.codes)();

            match self.storage.orders.place(order).await? {
                Placement::Placed(order) => {
                    tracing::info!(
                        order_id = %order.id,
                        order_code = %order.order_code,
                        restaurant = %order.restaurant,
                        total = %order.total_price,
                        "order placed"
                    );
                    return Ok(order);
                }
                Placement::CodeTaken => {
                    tracing::debug!(attempt, "order code collision, retrying");
                }
                Placement::RestaurantMissing => {
                    return Err(AppError::not_found("restaurant", restaurant));
                }
                Placement::StatsDeferred { order, reason } => {
                    tracing::error!(
                        order_id = %order.id,
                        order_code = %order.order_code,
                        reason = %reason,
                        "order saved but restaurant stats were not applied"
                    );
                    return Err(IntegrityError::StatsNotApplied {
                        order_id: order.id,
                        order_code: order.order_code,
                        message: reason,
                    }
                    .into());
                }
            }
        }

        Err(IntegrityError::CodeExhausted {
            attempts: self.code_attempts,
        }
        .into())
    }

    /// Snapshot every submitted dish from the catalog, keeping the
    /// restaurant each one belongs to
    async fn resolve_items(&self, items: &[OrderItemRequest]) -> AppResult<Vec<(OrderItem, Uuid)>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = items.iter().map(|item| item.dish).collect();
        let dishes: HashMap<Uuid, _> = self
            .storage
            .catalog
            .get_dishes(&ids)
            .await?
            .into_iter()
            .map(|dish| (dish.id, dish))
            .collect();

        items
            .iter()
            .map(|item| {
                let dish = dishes
                    .get(&item.dish)
                    .ok_or_else(|| AppError::not_found("dish", item.dish))?;
                if !dish.is_available {
                    return Err(AppError::invalid(
                        "orderItems",
                        format!("dish '{}' is not available", dish.name),
                    ));
                }
                Ok((
                    OrderItem {
                        dish: dish.id,
                        name: dish.name.clone(),
                        price: dish.price,
                        image_url: dish.image_url.clone(),
                        qty: item.qty as u32,
                    },
                    dish.restaurant,
                ))
            })
            .collect()
    }

    async fn resolve_restaurant(
        &self,
        request: &PlaceOrderRequest,
        restaurants: &[Uuid],
    ) -> AppResult<Uuid> {
        let Some(first) = restaurants.first() else {
            let hint = request.restaurant.ok_or_else(|| {
                AppError::invalid("restaurant", "required when there are no dish items")
            })?;
            self.storage
                .catalog
                .get_restaurant(&hint)
                .await?
                .ok_or_else(|| AppError::not_found("restaurant", hint))?;
            return Ok(hint);
        };

        if restaurants.iter().any(|restaurant| restaurant != first) {
            return Err(AppError::invalid(
                "orderItems",
                "all dishes must come from the same restaurant",
            ));
        }
        if request.restaurant.is_some_and(|hint| &hint != first) {
            return Err(AppError::invalid(
                "restaurant",
                "does not match the restaurant of the dishes",
            ));
        }
        Ok(*first)
    }
}
