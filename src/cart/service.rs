//! Per-user carts with dishes resolved from the catalog

use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, AppResult};
use crate::core::Caller;
use crate::model::{CartItemView, CartLine, CartView};
use crate::storage::Storage;

/// Body of `POST /api/users/cart`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(alias = "dish")]
    pub dish_id: Uuid,
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub quantity: i64,
}

/// Body of `PUT /api/users/cart`
///
/// The web client sends the cart line id under `dishId`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    #[serde(alias = "dishId", alias = "itemId")]
    pub line_id: Uuid,
    pub quantity: i64,
}

#[derive(Clone)]
pub struct CartService {
    storage: Storage,
}

impl CartService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn view(&self, caller: &Caller) -> AppResult<CartView> {
        let lines = self.storage.carts.lines(&caller.user_id).await?;
        self.resolve(caller.user_id, lines).await
    }

    /// Add `quantity` of a dish, merging with an existing line for it
    pub async fn add(&self, caller: &Caller, request: AddToCartRequest) -> AppResult<CartView> {
        request.validate()?;
        if self
            .storage
            .catalog
            .get_dish(&request.dish_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("dish", request.dish_id));
        }
        let quantity = u32::try_from(request.quantity)
            .map_err(|_| AppError::invalid("quantity", "must be a positive integer"))?;

        let lines = self
            .storage
            .carts
            .add_item(&caller.user_id, &request.dish_id, quantity)
            .await?;
        self.resolve(caller.user_id, lines).await
    }

    /// Overwrite a line's quantity; zero or less removes the line
    pub async fn set_quantity(
        &self,
        caller: &Caller,
        request: SetQuantityRequest,
    ) -> AppResult<CartView> {
        let lines = self
            .storage
            .carts
            .set_quantity(&caller.user_id, &request.line_id, request.quantity)
            .await?
            .ok_or_else(|| AppError::not_found("cart item", request.line_id))?;
        self.resolve(caller.user_id, lines).await
    }

    pub async fn clear(&self, caller: &Caller) -> AppResult<CartView> {
        self.storage.carts.clear(&caller.user_id).await?;
        Ok(CartView {
            user: caller.user_id,
            items: Vec::new(),
        })
    }

    async fn resolve(&self, user: Uuid, lines: Vec<CartLine>) -> AppResult<CartView> {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.dish).collect();
        let mut dishes: HashMap<Uuid, _> = self
            .storage
            .catalog
            .get_dishes(&ids)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            match dishes.remove(&line.dish) {
                Some(dish) => items.push(CartItemView {
                    id: line.id,
                    dish,
                    quantity: line.quantity,
                }),
                None => {
                    tracing::warn!(user = %user, dish = %line.dish, "cart line points to a missing dish");
                }
            }
        }
        Ok(CartView { user, items })
    }
}
