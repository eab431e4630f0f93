//! Dishes: the authoritative source of price, name and availability

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: Uuid,
    pub restaurant: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub diet_types: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
    /// Preparation time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(Dish, "dishes", "dish");

impl Dish {
    pub fn new(restaurant: Uuid, name: String, price: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            restaurant,
            name,
            description: String::new(),
            price,
            image_url: None,
            is_available: true,
            nutrition: Nutrition::default(),
            diet_types: Vec::new(),
            health_goals: Vec::new(),
            prep_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: DishPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if let Some(available) = patch.is_available {
            self.is_available = available;
        }
        if let Some(nutrition) = patch.nutrition {
            self.nutrition = nutrition;
        }
        if let Some(diet_types) = patch.diet_types {
            self.diet_types = diet_types;
        }
        if let Some(health_goals) = patch.health_goals {
            self.health_goals = health_goals;
        }
        if patch.prep_time.is_some() {
            self.prep_time = patch.prep_time;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial dish update; serializes to only the fields that are set
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
}
