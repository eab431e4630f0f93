//! Restaurants and menus
//!
//! Reads are public. Writes are limited to the restaurant owner, who can only
//! touch their own restaurant and its dishes.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, AppResult, EntityError};
use crate::core::validation::validators::{not_blank, positive_amount};
use crate::core::{Caller, Outcome};
use crate::model::{Dish, DishPatch, Nutrition, Restaurant, RestaurantProfile, Role};
use crate::storage::Storage;

/// Size of the public random dish sample
pub const RANDOM_DISHES: usize = 100;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub image_url: Option<String>,
}

impl From<RestaurantRequest> for RestaurantProfile {
    fn from(request: RestaurantRequest) -> Self {
        RestaurantProfile {
            name: request.name.map(|n| n.trim().to_string()),
            address: request.address,
            description: request.description,
            cuisine: request.cuisine,
            image_url: request.image_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewDishRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "positive_amount"))]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub diet_types: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
    #[serde(default)]
    pub prep_time: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDishRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "positive_amount"))]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub nutrition: Option<Nutrition>,
    pub diet_types: Option<Vec<String>>,
    pub health_goals: Option<Vec<String>>,
    pub prep_time: Option<u32>,
}

impl From<UpdateDishRequest> for DishPatch {
    fn from(request: UpdateDishRequest) -> Self {
        DishPatch {
            name: request.name.map(|n| n.trim().to_string()),
            description: request.description,
            price: request.price,
            image_url: request.image_url,
            is_available: request.is_available,
            nutrition: request.nutrition,
            diet_types: request.diet_types,
            health_goals: request.health_goals,
            prep_time: request.prep_time,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    storage: Storage,
}

impl CatalogService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn restaurants(&self) -> AppResult<Vec<Restaurant>> {
        Ok(self.storage.catalog.list_restaurants().await?)
    }

    pub async fn restaurant(&self, id: Uuid) -> AppResult<Restaurant> {
        self.storage
            .catalog
            .get_restaurant(&id)
            .await?
            .ok_or_else(|| AppError::not_found("restaurant", id))
    }

    pub async fn restaurant_dishes(&self, id: Uuid) -> AppResult<Vec<Dish>> {
        let restaurant = self.restaurant(id).await?;
        Ok(self
            .storage
            .catalog
            .dishes_by_restaurant(&restaurant.id)
            .await?)
    }

    pub async fn random_dishes(&self) -> AppResult<Vec<Dish>> {
        Ok(self.storage.catalog.sample_dishes(RANDOM_DISHES).await?)
    }

    /// Register the caller's restaurant; one per owner
    pub async fn create_restaurant(
        &self,
        caller: &Caller,
        request: RestaurantRequest,
    ) -> AppResult<Restaurant> {
        caller.require_role(&[Role::Restaurant])?;
        request.validate()?;
        if request.name.is_none() {
            return Err(AppError::invalid("name", "must not be empty"));
        }

        let restaurant = Restaurant::new(caller.user_id, request.into());
        match self.storage.catalog.create_restaurant(restaurant).await? {
            Outcome::Done(restaurant) => {
                tracing::info!(restaurant = %restaurant.id, owner = %caller.user_id, "restaurant created");
                Ok(restaurant)
            }
            Outcome::Duplicate => Err(EntityError::AlreadyExists {
                entity_type: "restaurant".to_string(),
                key: format!("owner {}", caller.user_id),
            }
            .into()),
            Outcome::Missing => Err(AppError::Internal(
                "restaurant insert reported missing".into(),
            )),
        }
    }

    pub async fn own_restaurant(&self, caller: &Caller) -> AppResult<Restaurant> {
        caller.require_role(&[Role::Restaurant])?;
        self.storage
            .catalog
            .restaurant_by_owner(&caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("restaurant", format!("owner {}", caller.user_id)))
    }

    /// Partial profile update; counters are never written here
    pub async fn update_profile(
        &self,
        caller: &Caller,
        request: RestaurantRequest,
    ) -> AppResult<Restaurant> {
        request.validate()?;
        let restaurant = self.own_restaurant(caller).await?;
        self.storage
            .catalog
            .update_restaurant_profile(&restaurant.id, request.into())
            .await?
            .ok_or_else(|| AppError::not_found("restaurant", restaurant.id))
    }

    pub async fn menu(&self, caller: &Caller) -> AppResult<Vec<Dish>> {
        let restaurant = self.own_restaurant(caller).await?;
        Ok(self
            .storage
            .catalog
            .dishes_by_restaurant(&restaurant.id)
            .await?)
    }

    pub async fn add_dish(&self, caller: &Caller, request: NewDishRequest) -> AppResult<Dish> {
        request.validate()?;
        let restaurant = self.own_restaurant(caller).await?;

        let mut dish = Dish::new(restaurant.id, request.name.trim().to_string(), request.price);
        dish.description = request.description;
        dish.image_url = request.image_url;
        dish.is_available = request.is_available.unwrap_or(true);
        dish.nutrition = request.nutrition;
        dish.diet_types = request.diet_types;
        dish.health_goals = request.health_goals;
        dish.prep_time = request.prep_time;

        Ok(self.storage.catalog.create_dish(dish).await?)
    }

    pub async fn update_dish(
        &self,
        caller: &Caller,
        id: Uuid,
        request: UpdateDishRequest,
    ) -> AppResult<Dish> {
        request.validate()?;
        self.owned_dish(caller, id).await?;
        self.storage
            .catalog
            .update_dish(&id, request.into())
            .await?
            .ok_or_else(|| AppError::not_found("dish", id))
    }

    pub async fn delete_dish(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        self.owned_dish(caller, id).await?;
        if !self.storage.catalog.delete_dish(&id).await? {
            return Err(AppError::not_found("dish", id));
        }
        Ok(())
    }

    async fn owned_dish(&self, caller: &Caller, id: Uuid) -> AppResult<Dish> {
        let restaurant = self.own_restaurant(caller).await?;
        let dish = self
            .storage
            .catalog
            .get_dish(&id)
            .await?
            .ok_or_else(|| AppError::not_found("dish", id))?;
        if dish.restaurant != restaurant.id {
            return Err(AppError::forbidden("dish belongs to another restaurant"));
        }
        Ok(dish)
    }
}
