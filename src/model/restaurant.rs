//! Restaurants and their aggregate counters

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    /// Owning user; one restaurant per owner
    pub owner: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Only ever incremented, once per placed order
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_revenue: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Restaurant, "restaurants", "restaurant");

impl Restaurant {
    pub fn new(owner: Uuid, profile: RestaurantProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            name: profile.name.unwrap_or_default(),
            address: profile.address.unwrap_or_default(),
            description: profile.description.unwrap_or_default(),
            cuisine: profile.cuisine.unwrap_or_default(),
            image_url: profile.image_url,
            total_orders: 0,
            total_revenue: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply profile fields in place. Counters are not reachable from here.
    pub fn apply_profile(&mut self, profile: RestaurantProfile) {
        if let Some(name) = profile.name {
            self.name = name;
        }
        if let Some(address) = profile.address {
            self.address = address;
        }
        if let Some(description) = profile.description {
            self.description = description;
        }
        if let Some(cuisine) = profile.cuisine {
            self.cuisine = cuisine;
        }
        if profile.image_url.is_some() {
            self.image_url = profile.image_url;
        }
        self.updated_at = Utc::now();
    }
}

/// Editable profile fields of a restaurant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
