//! In-memory storage for testing and development
//!
//! All collections live behind one `RwLock`, so every multi-record write
//! (order plus restaurant counters, cart merges, status compare-and-set)
//! happens under a single write guard.

use crate::core::{
    CartStore, CatalogStore, CustomOrderStore, OrderStore, Outcome, Placement, UserStore,
};
use crate::model::{
    CartLine, CustomOrder, CustomOrderUpdate, Dish, DishPatch, Order, OrderStatus, PaymentStatus,
    Restaurant, RestaurantProfile, Role, User, UserPatch, normalize_email,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    restaurants: HashMap<Uuid, Restaurant>,
    dishes: HashMap<Uuid, Dish>,
    carts: HashMap<Uuid, Vec<CartLine>>,
    orders: HashMap<Uuid, Order>,
    order_codes: HashSet<String>,
    custom_orders: HashMap<Uuid, CustomOrder>,
}

/// In-memory store implementing every storage trait
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an order as given without touching restaurant counters.
    /// Orders imported with `stats_applied = false` are left for
    /// reconciliation. Returns `false` when the order code is taken.
    pub fn import_order(&self, order: Order) -> Result<bool> {
        let mut state = self.write()?;
        if !state.order_codes.insert(order.order_code.clone()) {
            return Ok(false);
        }
        state.orders.insert(order.id, order);
        Ok(true)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created(item)));
    items
}

fn increment_stats(state: &mut State, order: &Order) -> Result<()> {
    let restaurant = state
        .restaurants
        .get_mut(&order.restaurant)
        .ok_or_else(|| anyhow!("Restaurant {} not found", order.restaurant))?;
    let revenue = restaurant
        .total_revenue
        .checked_add(order.total_price)
        .ok_or_else(|| anyhow!("Revenue of restaurant {} would overflow", order.restaurant))?;
    restaurant.total_orders += 1;
    restaurant.total_revenue = revenue;
    restaurant.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, mut user: User) -> Result<Outcome<User>> {
        let mut state = self.write()?;
        user.email = normalize_email(&user.email);
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(Outcome::Duplicate);
        }
        state.users.insert(user.id, user.clone());
        Ok(Outcome::Done(user))
    }

    async fn get(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let users = self
            .read()?
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        Ok(newest_first(users, |u: &User| u.created_at))
    }

    async fn update(&self, id: &Uuid, patch: UserPatch) -> Result<Outcome<User>> {
        let mut state = self.write()?;
        let email = patch.email.as_deref().map(normalize_email);
        if let Some(email) = &email
            && state
                .users
                .values()
                .any(|u| &u.email == email && &u.id != id)
        {
            return Ok(Outcome::Duplicate);
        }

        let Some(user) = state.users.get_mut(id) else {
            return Ok(Outcome::Missing);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if patch.phone.is_some() {
            user.phone = patch.phone;
        }
        user.updated_at = Utc::now();
        Ok(Outcome::Done(user.clone()))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut state = self.write()?;
        state.carts.remove(id);
        Ok(state.users.remove(id).is_some())
    }

    async fn count(&self, role: Option<Role>) -> Result<u64> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .count() as u64)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Outcome<Restaurant>> {
        let mut state = self.write()?;
        if state
            .restaurants
            .values()
            .any(|r| r.owner == restaurant.owner)
        {
            return Ok(Outcome::Duplicate);
        }
        state.restaurants.insert(restaurant.id, restaurant.clone());
        Ok(Outcome::Done(restaurant))
    }

    async fn get_restaurant(&self, id: &Uuid) -> Result<Option<Restaurant>> {
        Ok(self.read()?.restaurants.get(id).cloned())
    }

    async fn restaurant_by_owner(&self, owner: &Uuid) -> Result<Option<Restaurant>> {
        Ok(self
            .read()?
            .restaurants
            .values()
            .find(|r| &r.owner == owner)
            .cloned())
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let restaurants = self.read()?.restaurants.values().cloned().collect();
        Ok(newest_first(restaurants, |r: &Restaurant| r.created_at))
    }

    async fn update_restaurant_profile(
        &self,
        id: &Uuid,
        profile: RestaurantProfile,
    ) -> Result<Option<Restaurant>> {
        let mut state = self.write()?;
        Ok(state.restaurants.get_mut(id).map(|r| {
            r.apply_profile(profile);
            r.clone()
        }))
    }

    async fn count_restaurants(&self) -> Result<u64> {
        Ok(self.read()?.restaurants.len() as u64)
    }

    async fn create_dish(&self, dish: Dish) -> Result<Dish> {
        self.write()?.dishes.insert(dish.id, dish.clone());
        Ok(dish)
    }

    async fn get_dish(&self, id: &Uuid) -> Result<Option<Dish>> {
        Ok(self.read()?.dishes.get(id).cloned())
    }

    async fn get_dishes(&self, ids: &[Uuid]) -> Result<Vec<Dish>> {
        let state = self.read()?;
        let unique: HashSet<&Uuid> = ids.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| state.dishes.get(id).cloned())
            .collect())
    }

    async fn dishes_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<Dish>> {
        let dishes = self
            .read()?
            .dishes
            .values()
            .filter(|d| &d.restaurant == restaurant)
            .cloned()
            .collect();
        Ok(newest_first(dishes, |d: &Dish| d.created_at))
    }

    async fn update_dish(&self, id: &Uuid, patch: DishPatch) -> Result<Option<Dish>> {
        let mut state = self.write()?;
        Ok(state.dishes.get_mut(id).map(|d| {
            d.apply(patch);
            d.clone()
        }))
    }

    async fn delete_dish(&self, id: &Uuid) -> Result<bool> {
        Ok(self.write()?.dishes.remove(id).is_some())
    }

    async fn sample_dishes(&self, size: usize) -> Result<Vec<Dish>> {
        let mut dishes: Vec<Dish> = self.read()?.dishes.values().cloned().collect();
        dishes.shuffle(&mut rand::thread_rng());
        dishes.truncate(size);
        Ok(dishes)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn lines(&self, user: &Uuid) -> Result<Vec<CartLine>> {
        Ok(self.read()?.carts.get(user).cloned().unwrap_or_default())
    }

    async fn add_item(&self, user: &Uuid, dish: &Uuid, quantity: u32) -> Result<Vec<CartLine>> {
        let mut state = self.write()?;
        let lines = state.carts.entry(*user).or_default();
        match lines.iter_mut().find(|line| &line.dish == dish) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => lines.push(CartLine::new(*dish, quantity)),
        }
        Ok(lines.clone())
    }

    async fn set_quantity(
        &self,
        user: &Uuid,
        line: &Uuid,
        quantity: i64,
    ) -> Result<Option<Vec<CartLine>>> {
        let mut state = self.write()?;
        let Some(lines) = state.carts.get_mut(user) else {
            return Ok(None);
        };
        let Some(index) = lines.iter().position(|l| &l.id == line) else {
            return Ok(None);
        };

        if quantity <= 0 {
            lines.remove(index);
        } else {
            lines[index].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        Ok(Some(lines.clone()))
    }

    async fn clear(&self, user: &Uuid) -> Result<()> {
        self.write()?.carts.remove(user);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place(&self, mut order: Order) -> Result<Placement> {
        let mut state = self.write()?;
        if !state.restaurants.contains_key(&order.restaurant) {
            return Ok(Placement::RestaurantMissing);
        }
        if state.order_codes.contains(&order.order_code) {
            return Ok(Placement::CodeTaken);
        }

        increment_stats(&mut state, &order)?;
        order.stats_applied = true;
        state.order_codes.insert(order.order_code.clone());
        state.orders.insert(order.id, order.clone());
        Ok(Placement::Placed(order))
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        Ok(self.read()?.orders.get(id).cloned())
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>> {
        let orders = self
            .read()?
            .orders
            .values()
            .filter(|o| &o.user == user)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn list_by_restaurant(
        &self,
        restaurant: &Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let orders = self
            .read()?
            .orders
            .values()
            .filter(|o| &o.restaurant == restaurant && status.is_none_or(|s| o.order_status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn list_for_partner(&self, partner: &Uuid) -> Result<Vec<Order>> {
        let orders = self
            .read()?
            .orders
            .values()
            .filter(|o| {
                o.order_status == OrderStatus::Ready
                    || (o.delivery_partner.as_ref() == Some(partner)
                        && matches!(
                            o.order_status,
                            OrderStatus::OnTheWay | OrderStatus::Delivered
                        ))
            })
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self.read()?.orders.values().cloned().collect();
        Ok(newest_first(orders, |o: &Order| o.created_at))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.orders.len() as u64)
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        partner: Option<Uuid>,
    ) -> Result<Option<Order>> {
        let mut state = self.write()?;
        match state.orders.get_mut(id) {
            Some(order) if order.order_status == from => {
                order.order_status = to;
                if partner.is_some() {
                    order.delivery_partner = partner;
                }
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_paid(&self, id: &Uuid) -> Result<Option<Order>> {
        let mut state = self.write()?;
        Ok(state.orders.get_mut(id).map(|order| {
            if order.payment_status != PaymentStatus::Paid {
                order.payment_status = PaymentStatus::Paid;
                order.updated_at = Utc::now();
            }
            order.clone()
        }))
    }

    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<Order>> {
        let mut state = self.write()?;
        Ok(state.orders.get_mut(id).map(|order| {
            order.payment_ref = Some(payment_ref.to_string());
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn unapplied_stats(&self) -> Result<Vec<Order>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|o| !o.stats_applied)
            .cloned()
            .collect())
    }

    async fn apply_stats(&self, id: &Uuid) -> Result<bool> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Order {} not found", id))?;
        if order.stats_applied {
            return Ok(false);
        }

        increment_stats(&mut state, &order)?;
        if let Some(stored) = state.orders.get_mut(id) {
            stored.stats_applied = true;
        }
        Ok(true)
    }
}

#[async_trait]
impl CustomOrderStore for InMemoryStore {
    async fn create(&self, order: CustomOrder) -> Result<CustomOrder> {
        self.write()?.custom_orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<CustomOrder>> {
        Ok(self.read()?.custom_orders.get(id).cloned())
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<CustomOrder>> {
        let orders = self
            .read()?
            .custom_orders
            .values()
            .filter(|o| &o.user == user)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &CustomOrder| o.created_at))
    }

    async fn list_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<CustomOrder>> {
        let orders = self
            .read()?
            .custom_orders
            .values()
            .filter(|o| &o.restaurant == restaurant)
            .cloned()
            .collect();
        Ok(newest_first(orders, |o: &CustomOrder| o.created_at))
    }

    async fn update_status(
        &self,
        id: &Uuid,
        update: CustomOrderUpdate,
    ) -> Result<Option<CustomOrder>> {
        let mut state = self.write()?;
        match state.custom_orders.get_mut(id) {
            Some(order) if order.status == update.expected => {
                order.status = update.status;
                if let Some(price) = update.price {
                    order.price = price;
                }
                if update.restaurant_note.is_some() {
                    order.restaurant_note = update.restaurant_note;
                }
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_paid(&self, id: &Uuid) -> Result<Option<CustomOrder>> {
        let mut state = self.write()?;
        match state.custom_orders.get_mut(id) {
            Some(order) if order.payment_status == PaymentStatus::Pending => {
                order.payment_status = PaymentStatus::Paid;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<CustomOrder>> {
        let mut state = self.write()?;
        Ok(state.custom_orders.get_mut(id).map(|order| {
            order.payment_ref = Some(payment_ref.to_string());
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn link_order(&self, id: &Uuid, order_id: &Uuid) -> Result<Option<CustomOrder>> {
        let mut state = self.write()?;
        Ok(state.custom_orders.get_mut(id).map(|order| {
            order.order_id = Some(*order_id);
            order.updated_at = Utc::now();
            order.clone()
        }))
    }
}
