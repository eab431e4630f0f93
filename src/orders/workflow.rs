//! Order status workflow
//!
//! ```text
//! pending ─> preparing ─> ready ─> on-the-way ─> delivered
//!    └──────────┴───────────┴─> cancelled
//! ```
//!
//! | Edge | Who |
//! |---|---|
//! | `pending → preparing`, `preparing → ready` | owning restaurant, admin |
//! | `ready → on-the-way` | any delivery partner (claims the order) |
//! | `on-the-way → delivered` | the assigned delivery partner |
//! | `pending/preparing/ready → cancelled` | admin, the customer, owning restaurant |
//!
//! Every transition is a compare-and-set on the status read before the
//! guard ran, so two partners racing for the same order cannot both win.

use uuid::Uuid;

use crate::core::Caller;
use crate::core::error::{AppError, AppResult, IntegrityError, ValidationError};
use crate::model::{Order, OrderStatus, Role};
use crate::storage::Storage;

/// Whether `from → to` is an edge of the workflow graph
pub fn is_edge(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Preparing)
            | (Preparing, Ready)
            | (Ready, OnTheWay)
            | (OnTheWay, Delivered)
            | (Pending | Preparing | Ready, Cancelled)
    )
}

/// What the caller is to the order, resolved once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub is_customer: bool,
    pub owns_restaurant: bool,
    pub is_assigned_partner: bool,
}

impl Relation {
    pub fn can_view(&self, caller: &Caller) -> bool {
        caller.is_admin() || self.is_customer || self.owns_restaurant || self.is_assigned_partner
    }
}

/// Role guard for an edge already known to be legal
fn may_move(caller: &Caller, relation: Relation, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (Pending, Preparing) | (Preparing, Ready) => {
            caller.is_admin() || relation.owns_restaurant
        }
        (Ready, OnTheWay) => caller.is(Role::Delivery),
        (OnTheWay, Delivered) => caller.is(Role::Delivery) && relation.is_assigned_partner,
        (_, Cancelled) => caller.is_admin() || relation.is_customer || relation.owns_restaurant,
        _ => false,
    }
}

/// Applies guarded status transitions
#[derive(Clone)]
pub struct OrderWorkflow {
    storage: Storage,
}

impl OrderWorkflow {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn relation(&self, caller: &Caller, order: &Order) -> AppResult<Relation> {
        let owns_restaurant = if caller.is(Role::Restaurant) {
            self.storage
                .catalog
                .restaurant_by_owner(&caller.user_id)
                .await?
                .is_some_and(|r| r.id == order.restaurant)
        } else {
            false
        };
        Ok(Relation {
            is_customer: order.is_customer(caller.user_id),
            owns_restaurant,
            is_assigned_partner: order.is_assigned_to(caller.user_id),
        })
    }

    /// Move an order to `target` on behalf of `caller`
    pub async fn update_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
        target: &str,
    ) -> AppResult<Order> {
        let to: OrderStatus = target.parse().map_err(|_| ValidationError::UnknownStatus {
            value: target.to_string(),
        })?;

        let order = self
            .storage
            .orders
            .get(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("order", order_id))?;
        let from = order.order_status;
        let relation = self.relation(caller, &order).await?;

        if from == to {
            if relation.can_view(caller) || caller.is(Role::Delivery) {
                return Ok(order);
            }
            return Err(AppError::forbidden("not a participant of this order"));
        }

        if !is_edge(from, to) {
            return Err(ValidationError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        if !may_move(caller, relation, from, to) {
            return Err(AppError::forbidden(format!(
                "{} may not move this order from '{}' to '{}'",
                caller.role, from, to
            )));
        }

        let partner = (to == OrderStatus::OnTheWay).then_some(caller.user_id);
        match self
            .storage
            .orders
            .transition(&order_id, from, to, partner)
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    order_id = %order_id,
                    from = %from,
                    to = %to,
                    by = %caller.user_id,
                    "order status changed"
                );
                Ok(updated)
            }
            None => Err(IntegrityError::ConcurrentUpdate {
                entity_type: "order".to_string(),
                id: order_id,
            }
            .into()),
        }
    }
}
