//! Custom order workflow
//!
//! A customer asks a restaurant for something off the menu. The restaurant
//! accepts with a price or rejects, then drives it to completion. Once paid,
//! the custom order is promoted to a regular order through the placement
//! engine so the restaurant counters move the same way as for any order.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, AppResult, IntegrityError, ValidationError};
use crate::core::validation::validators::{not_blank, positive_amount};
use crate::core::Caller;
use crate::model::{
    CustomOrder, CustomOrderStatus, CustomOrderUpdate, DeliveryAddress, Restaurant, Role,
};
use crate::orders::{BasicItemRequest, OrderEngine, PlaceOrderRequest};
use crate::payment::{PaymentBridge, ProviderOrder, VerifyRequest};
use crate::storage::Storage;

/// Payment method recorded on orders promoted from custom orders
pub const ONLINE_PAYMENT: &str = "online";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomOrderRequest {
    #[serde(alias = "restaurantId")]
    pub restaurant: Uuid,
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default = "default_servings")]
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub servings: i64,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
}

fn default_servings() -> i64 {
    1
}

/// Restaurant answer to a pending request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    /// `accepted` or `rejected`
    #[validate(custom(function = "not_blank"))]
    pub status: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, alias = "note")]
    pub restaurant_note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdvanceRequest {
    #[validate(custom(function = "not_blank"))]
    pub status: String,
}

fn parse_status(value: &str) -> AppResult<CustomOrderStatus> {
    value.trim().parse().map_err(|_| {
        ValidationError::UnknownStatus {
            value: value.to_string(),
        }
        .into()
    })
}

fn invalid_transition(from: CustomOrderStatus, to: CustomOrderStatus) -> AppError {
    ValidationError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
    .into()
}

#[derive(Clone)]
pub struct CustomOrderService {
    storage: Storage,
    engine: OrderEngine,
    payments: PaymentBridge,
}

impl CustomOrderService {
    pub fn new(storage: Storage, engine: OrderEngine, payments: PaymentBridge) -> Self {
        Self {
            storage,
            engine,
            payments,
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateCustomOrderRequest,
    ) -> AppResult<CustomOrder> {
        caller.require_role(&[Role::Customer])?;
        request.validate()?;
        if self
            .storage
            .catalog
            .get_restaurant(&request.restaurant)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("restaurant", request.restaurant));
        }

        let ingredients = request
            .ingredients
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        let order = CustomOrder::new(
            caller.user_id,
            request.restaurant,
            request.title.trim().to_string(),
            request.description.trim().to_string(),
            ingredients,
            request.servings as u32,
            request.delivery_address,
        );
        let order = self.storage.custom_orders.create(order).await?;
        tracing::info!(custom_order = %order.id, restaurant = %order.restaurant, "custom order requested");
        Ok(order)
    }

    pub async fn mine(&self, caller: &Caller) -> AppResult<Vec<CustomOrder>> {
        caller.require_role(&[Role::Customer])?;
        Ok(self
            .storage
            .custom_orders
            .list_by_user(&caller.user_id)
            .await?)
    }

    pub async fn for_restaurant(&self, caller: &Caller) -> AppResult<Vec<CustomOrder>> {
        let restaurant = self.owned_restaurant(caller).await?;
        Ok(self
            .storage
            .custom_orders
            .list_by_restaurant(&restaurant.id)
            .await?)
    }

    /// Visible to the requesting customer, the restaurant owner and admins
    pub async fn get(&self, caller: &Caller, id: Uuid) -> AppResult<CustomOrder> {
        let order = self.load(id).await?;
        if caller.is_admin() || order.user == caller.user_id {
            return Ok(order);
        }
        if caller.is(Role::Restaurant) && self.owns(caller, &order).await? {
            return Ok(order);
        }
        Err(AppError::forbidden("not a participant of this custom order"))
    }

    /// Accept with a price, or reject with an optional note
    pub async fn respond(
        &self,
        caller: &Caller,
        id: Uuid,
        request: RespondRequest,
    ) -> AppResult<CustomOrder> {
        request.validate()?;
        let order = self.owned_order(caller, id).await?;
        let target = parse_status(&request.status)?;

        let price = match target {
            CustomOrderStatus::Accepted => match request.price {
                Some(price) if positive_amount(&price).is_ok() => Some(price),
                _ => {
                    return Err(AppError::invalid(
                        "price",
                        "must be greater than zero and at most 10000000",
                    ));
                }
            },
            CustomOrderStatus::Rejected => None,
            other => return Err(invalid_transition(order.status, other)),
        };
        if order.status != CustomOrderStatus::Pending {
            return Err(invalid_transition(order.status, target));
        }

        let note = request
            .restaurant_note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.apply(
            &order,
            CustomOrderUpdate {
                expected: CustomOrderStatus::Pending,
                status: target,
                price,
                restaurant_note: note,
            },
        )
        .await
    }

    /// `accepted → in-progress → completed`; the current status is a no-op
    pub async fn advance(
        &self,
        caller: &Caller,
        id: Uuid,
        request: AdvanceRequest,
    ) -> AppResult<CustomOrder> {
        request.validate()?;
        let order = self.owned_order(caller, id).await?;
        let target = parse_status(&request.status)?;
        if order.status == target {
            return Ok(order);
        }

        let allowed = matches!(
            (order.status, target),
            (CustomOrderStatus::Accepted, CustomOrderStatus::InProgress)
                | (CustomOrderStatus::InProgress, CustomOrderStatus::Completed)
        );
        if !allowed {
            return Err(invalid_transition(order.status, target));
        }

        self.apply(
            &order,
            CustomOrderUpdate {
                expected: order.status,
                status: target,
                price: None,
                restaurant_note: None,
            },
        )
        .await
    }

    /// Create a provider charge for the negotiated price
    pub async fn create_payment(&self, caller: &Caller, id: Uuid) -> AppResult<ProviderOrder> {
        let order = self.customer_order(caller, id).await?;
        Self::ensure_payable(&order)?;
        let charge = self.payments.create_charge(order.price, None).await?;
        self.storage
            .custom_orders
            .set_payment_ref(&id, &charge.id)
            .await?
            .ok_or_else(|| AppError::not_found("custom order", id))?;
        Ok(charge)
    }

    /// Confirm the payment by signature, then promote to a regular order.
    ///
    /// A custom order that is paid but has no regular order yet (promotion
    /// failed after payment) may be confirmed again to retry the promotion.
    pub async fn verify_payment(
        &self,
        caller: &Caller,
        id: Uuid,
        request: VerifyRequest,
    ) -> AppResult<CustomOrder> {
        let order = self.customer_order(caller, id).await?;
        let unpromoted = order.is_paid() && order.order_id.is_none();
        if !unpromoted {
            Self::ensure_payable(&order)?;
        }
        self.payments.require_verified(&request)?;
        self.payments.require_charge(order.payment_ref.as_deref(), &request)?;

        let paid = if unpromoted {
            tracing::warn!(custom_order = %id, "retrying promotion of paid custom order");
            order
        } else {
            let paid = self
                .storage
                .custom_orders
                .mark_paid(&id)
                .await?
                .ok_or_else(|| {
                    AppError::invalid("paymentStatus", "custom order is already paid")
                })?;
            tracing::info!(custom_order = %id, payment = %request.payment_id, "custom order paid");
            paid
        };

        let placed = self
            .engine
            .place(
                paid.user,
                PlaceOrderRequest {
                    basic_items: vec![BasicItemRequest {
                        name: paid.title.clone(),
                        price: paid.price,
                        quantity: 1,
                    }],
                    delivery_address: paid.delivery_address.clone(),
                    payment_method: ONLINE_PAYMENT.to_string(),
                    restaurant: Some(paid.restaurant),
                    ..Default::default()
                },
            )
            .await;
        let order_id = match &placed {
            Ok(order) => Some(order.id),
            // The order exists, only its counters are pending; link it anyway
            Err(AppError::Integrity(IntegrityError::StatsNotApplied { order_id, .. })) => {
                Some(*order_id)
            }
            Err(_) => None,
        };
        let Some(order_id) = order_id else {
            return placed.map(|_| paid);
        };

        let linked = self
            .storage
            .custom_orders
            .link_order(&id, &order_id)
            .await?
            .ok_or_else(|| AppError::not_found("custom order", id))?;
        placed.map(|_| linked)
    }

    fn ensure_payable(order: &CustomOrder) -> AppResult<()> {
        if !order.status.is_payable() {
            return Err(AppError::invalid(
                "status",
                format!("custom order is {}, payment needs acceptance", order.status),
            ));
        }
        if order.price <= Decimal::ZERO {
            return Err(AppError::invalid("price", "custom order has no price yet"));
        }
        if order.is_paid() {
            return Err(AppError::invalid(
                "paymentStatus",
                "custom order is already paid",
            ));
        }
        Ok(())
    }

    async fn apply(&self, order: &CustomOrder, update: CustomOrderUpdate) -> AppResult<CustomOrder> {
        let (from, to) = (update.expected, update.status);
        match self
            .storage
            .custom_orders
            .update_status(&order.id, update)
            .await?
        {
            Some(updated) => {
                tracing::info!(custom_order = %order.id, from = %from, to = %to, "custom order status changed");
                Ok(updated)
            }
            None => Err(IntegrityError::ConcurrentUpdate {
                entity_type: "custom order".to_string(),
                id: order.id,
            }
            .into()),
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<CustomOrder> {
        self.storage
            .custom_orders
            .get(&id)
            .await?
            .ok_or_else(|| AppError::not_found("custom order", id))
    }

    async fn customer_order(&self, caller: &Caller, id: Uuid) -> AppResult<CustomOrder> {
        caller.require_role(&[Role::Customer])?;
        let order = self.load(id).await?;
        if order.user != caller.user_id {
            return Err(AppError::forbidden("not your custom order"));
        }
        Ok(order)
    }

    async fn owned_order(&self, caller: &Caller, id: Uuid) -> AppResult<CustomOrder> {
        caller.require_role(&[Role::Restaurant])?;
        let order = self.load(id).await?;
        if !self.owns(caller, &order).await? {
            return Err(AppError::forbidden("custom order belongs to another restaurant"));
        }
        Ok(order)
    }

    async fn owns(&self, caller: &Caller, order: &CustomOrder) -> AppResult<bool> {
        Ok(self
            .storage
            .catalog
            .restaurant_by_owner(&caller.user_id)
            .await?
            .is_some_and(|r| r.id == order.restaurant))
    }

    async fn owned_restaurant(&self, caller: &Caller) -> AppResult<Restaurant> {
        caller.require_role(&[Role::Restaurant])?;
        self.storage
            .catalog
            .restaurant_by_owner(&caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("restaurant", format!("owner {}", caller.user_id)))
    }
}
