//! Storage traits for every collection of the ordering domain
//!
//! Implementations are storage agnostic: an in-memory backend for tests and
//! development, and a MongoDB backend behind the `mongodb_backend` feature.
//! All methods return `anyhow::Result`; expected business outcomes (duplicate
//! keys, lost compare-and-set races) are reported through the `Ok` value so
//! the service layer can map them to typed errors.

use crate::model::{
    CartLine, CustomOrder, CustomOrderUpdate, Dish, DishPatch, Order, OrderStatus, Restaurant,
    RestaurantProfile, Role, User, UserPatch,
};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a write guarded by existence and uniqueness
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// The record to update does not exist
    Missing,
    /// A unique key is already taken
    Duplicate,
}

/// Result of persisting a new order together with its restaurant counters
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Order stored and counters incremented
    Placed(Order),
    /// Another order already holds this code; nothing was written
    CodeTaken,
    /// The order's restaurant does not exist; nothing was written
    RestaurantMissing,
    /// The order is stored with `statsApplied = false` but the counter update
    /// failed; reconciliation will apply it later
    StatsDeferred { order: Order, reason: String },
}

/// Service trait for user profiles
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; `Duplicate` when the email is taken
    async fn create(&self, user: User) -> Result<Outcome<User>>;

    async fn get(&self, id: &Uuid) -> Result<Option<User>>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users, optionally filtered by role
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>>;

    async fn update(&self, id: &Uuid, patch: UserPatch) -> Result<Outcome<User>>;

    /// Returns whether a user was removed
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    async fn count(&self, role: Option<Role>) -> Result<u64>;
}

/// Service trait for restaurants and dishes
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a restaurant; `Duplicate` when the owner already has one
    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Outcome<Restaurant>>;

    async fn get_restaurant(&self, id: &Uuid) -> Result<Option<Restaurant>>;

    async fn restaurant_by_owner(&self, owner: &Uuid) -> Result<Option<Restaurant>>;

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>>;

    /// Set profile fields only; the counters are never written here
    async fn update_restaurant_profile(
        &self,
        id: &Uuid,
        profile: RestaurantProfile,
    ) -> Result<Option<Restaurant>>;

    async fn count_restaurants(&self) -> Result<u64>;

    async fn create_dish(&self, dish: Dish) -> Result<Dish>;

    async fn get_dish(&self, id: &Uuid) -> Result<Option<Dish>>;

    /// Batch lookup; ids without a dish are simply absent from the result
    async fn get_dishes(&self, ids: &[Uuid]) -> Result<Vec<Dish>>;

    async fn dishes_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<Dish>>;

    async fn update_dish(&self, id: &Uuid, patch: DishPatch) -> Result<Option<Dish>>;

    async fn delete_dish(&self, id: &Uuid) -> Result<bool>;

    /// Up to `size` dishes in random order
    async fn sample_dishes(&self, size: usize) -> Result<Vec<Dish>>;
}

/// Service trait for per-user carts
///
/// Every mutation is atomic per user cart and returns the resulting lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn lines(&self, user: &Uuid) -> Result<Vec<CartLine>>;

    /// Increment the line for `dish`, or append a new one
    async fn add_item(&self, user: &Uuid, dish: &Uuid, quantity: u32) -> Result<Vec<CartLine>>;

    /// Overwrite a line's quantity, removing it when `quantity <= 0`.
    /// `None` when the line is not in the user's cart.
    async fn set_quantity(
        &self,
        user: &Uuid,
        line: &Uuid,
        quantity: i64,
    ) -> Result<Option<Vec<CartLine>>>;

    async fn clear(&self, user: &Uuid) -> Result<()>;
}

/// Service trait for regular orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and increment its restaurant's counters by one
    /// order and the order total, as one unit where the backend allows it
    async fn place(&self, order: Order) -> Result<Placement>;

    async fn get(&self, id: &Uuid) -> Result<Option<Order>>;

    /// A customer's orders, newest first
    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>>;

    /// A restaurant's orders, newest first, optionally with one status
    async fn list_by_restaurant(
        &self,
        restaurant: &Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;

    /// Orders that are `ready`, plus the partner's own `on-the-way` and
    /// `delivered` orders
    async fn list_for_partner(&self, partner: &Uuid) -> Result<Vec<Order>>;

    async fn list_all(&self) -> Result<Vec<Order>>;

    async fn count(&self) -> Result<u64>;

    /// Compare-and-set the status. When `partner` is given it becomes the
    /// order's delivery partner. `None` when the order is missing or its
    /// status is no longer `from`.
    async fn transition(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        partner: Option<Uuid>,
    ) -> Result<Option<Order>>;

    /// Set the payment status to `Paid`; `None` when the order is missing
    async fn mark_paid(&self, id: &Uuid) -> Result<Option<Order>>;

    /// Remember the provider charge created for this order, replacing any
    /// earlier one; `None` when the order is missing
    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<Order>>;

    /// Orders whose counters have not been applied yet
    async fn unapplied_stats(&self) -> Result<Vec<Order>>;

    /// Claim the order's `statsApplied` flag and increment the restaurant
    /// counters. Returns `false` when the flag was already set.
    async fn apply_stats(&self, id: &Uuid) -> Result<bool>;
}

/// Service trait for custom orders
#[async_trait]
pub trait CustomOrderStore: Send + Sync {
    async fn create(&self, order: CustomOrder) -> Result<CustomOrder>;

    async fn get(&self, id: &Uuid) -> Result<Option<CustomOrder>>;

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<CustomOrder>>;

    async fn list_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<CustomOrder>>;

    /// Compare-and-set on `update.expected`
    async fn update_status(
        &self,
        id: &Uuid,
        update: CustomOrderUpdate,
    ) -> Result<Option<CustomOrder>>;

    /// Flip payment from `Pending` to `Paid`; `None` when already paid or missing
    async fn mark_paid(&self, id: &Uuid) -> Result<Option<CustomOrder>>;

    /// Remember the provider charge created for this custom order
    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<CustomOrder>>;

    /// Record the regular order created from this custom order
    async fn link_order(&self, id: &Uuid, order_id: &Uuid) -> Result<Option<CustomOrder>>;
}
