//! Per-user carts

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Dish;

/// A stored cart line; at most one per (user, dish)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub dish: Uuid,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(dish: Uuid, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            dish,
            quantity,
        }
    }
}

/// A cart line with its dish resolved from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: Uuid,
    pub dish: Dish,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub user: Uuid,
    pub items: Vec<CartItemView>,
}
