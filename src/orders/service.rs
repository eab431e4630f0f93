//! Order queries scoped to the caller

use uuid::Uuid;

use super::workflow::OrderWorkflow;
use crate::core::Caller;
use crate::core::error::{AppError, AppResult};
use crate::model::{CompletedOrdersReport, Order, OrderStatus, Restaurant, Role};
use crate::storage::Storage;

#[derive(Clone)]
pub struct OrderService {
    storage: Storage,
    workflow: OrderWorkflow,
}

impl OrderService {
    pub fn new(storage: Storage) -> Self {
        Self {
            workflow: OrderWorkflow::new(storage.clone()),
            storage,
        }
    }

    pub async fn my_orders(&self, caller: &Caller) -> AppResult<Vec<Order>> {
        Ok(self.storage.orders.list_by_user(&caller.user_id).await?)
    }

    pub async fn partner_board(&self, caller: &Caller) -> AppResult<Vec<Order>> {
        caller.require_role(&[Role::Delivery])?;
        Ok(self
            .storage
            .orders
            .list_for_partner(&caller.user_id)
            .await?)
    }

    pub async fn all(&self, caller: &Caller) -> AppResult<Vec<Order>> {
        caller.require_admin()?;
        Ok(self.storage.orders.list_all().await?)
    }

    /// A single order, visible to its participants and admins
    pub async fn get(&self, caller: &Caller, id: Uuid) -> AppResult<Order> {
        let order = self
            .storage
            .orders
            .get(&id)
            .await?
            .ok_or_else(|| AppError::not_found("order", id))?;
        let relation = self.workflow.relation(caller, &order).await?;
        if !relation.can_view(caller) {
            return Err(AppError::forbidden("not a participant of this order"));
        }
        Ok(order)
    }

    pub async fn restaurant_orders(&self, caller: &Caller) -> AppResult<Vec<Order>> {
        let restaurant = self.owned_restaurant(caller).await?;
        Ok(self
            .storage
            .orders
            .list_by_restaurant(&restaurant.id, None)
            .await?)
    }

    pub async fn completed_report(&self, caller: &Caller) -> AppResult<CompletedOrdersReport> {
        let restaurant = self.owned_restaurant(caller).await?;
        let delivered = self
            .storage
            .orders
            .list_by_restaurant(&restaurant.id, Some(OrderStatus::Delivered))
            .await?;
        Ok(CompletedOrdersReport::from_orders(delivered))
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
