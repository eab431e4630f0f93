//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! One collection per record type (`users`, `restaurants`, `dishes`, `carts`,
//! `orders`, `custom_orders`), named by `Entity::resource_name()`. Carts are
//! one document per user (`_id` = user id) holding an array of lines. Orders
//! embed their line-item snapshots.
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs and timestamps are stored as
//! strings, money as `Decimal128` so server-side `$inc` stays exact. The `id` field is mapped to MongoDB's `_id`.
//!
//! # Order placement
//!
//! With `transactions` enabled (replica set required) the order insert and the
//! restaurant `$inc` run in one session transaction. Otherwise the order is
//! inserted with `statsApplied: false`, then the flag is claimed and the
//! counters incremented; a failed increment releases the claim and the order
//! is left for reconciliation.

use crate::core::entity::Entity;
use crate::core::{
    CartStore, CatalogStore, CustomOrderStore, OrderStore, Outcome, Placement, UserStore,
};
use crate::model::{
    CartLine, CustomOrder, CustomOrderUpdate, Dish, DishPatch, Order, OrderStatus, Restaurant,
    RestaurantProfile, Role, User, UserPatch, normalize_email,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Decimal128, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, ClientSession, Collection, Database, IndexModel};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use uuid::Uuid;

const DUPLICATE_KEY: i32 = 11000;
const CART_MERGE_ATTEMPTS: usize = 3;

/// Fields holding money, at any depth of a record
const MONEY_FIELDS: [&str; 3] = ["price", "totalPrice", "totalRevenue"];
const DECIMAL128_EXPONENT_BIAS: i64 = 6176;
const DECIMAL128_COEFFICIENT_BITS: u32 = 113;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }
    money_to_decimal128(&mut doc)?;

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> Result<serde_json::Value> {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    let mut bson = Bson::Document(doc);
    decimal128_to_double(&mut bson)?;
    Ok(bson.into_relaxed_extjson())
}

/// Encode a decimal as BSON `Decimal128` (binary integer decimal layout).
/// Every `Decimal` coefficient fits in the 113 low bits.
fn decimal_bson(value: Decimal) -> Bson {
    let mantissa = value.mantissa();
    let exponent = (DECIMAL128_EXPONENT_BIAS - i64::from(value.scale())) as u128;
    let mut bits = (exponent << DECIMAL128_COEFFICIENT_BITS) | mantissa.unsigned_abs();
    if mantissa < 0 {
        bits |= 1u128 << 127;
    }
    Bson::Decimal128(Decimal128::from_bytes(bits.to_le_bytes()))
}

/// Decode a `Decimal128`; `None` for NaN, infinities and values out of range
fn decimal_from_bson(value: &Decimal128) -> Option<Decimal> {
    let bits = u128::from_le_bytes(value.bytes());
    // Combination field 11xxx: large-coefficient form or a special value
    if (bits >> 125) & 0b11 == 0b11 {
        return None;
    }
    let exponent =
        ((bits >> DECIMAL128_COEFFICIENT_BITS) & 0x3FFF) as i64 - DECIMAL128_EXPONENT_BIAS;
    let coefficient = bits & ((1u128 << DECIMAL128_COEFFICIENT_BITS) - 1);
    let sign = if bits >> 127 == 1 { "-" } else { "" };
    Decimal::from_scientific(&format!("{sign}{coefficient}e{exponent}")).ok()
}

fn money_to_decimal128(doc: &mut Document) -> Result<()> {
    for (key, value) in doc.iter_mut() {
        let number = match value {
            Bson::Double(f) if MONEY_FIELDS.contains(&key.as_str()) => f.to_string(),
            Bson::Int32(i) if MONEY_FIELDS.contains(&key.as_str()) => i.to_string(),
            Bson::Int64(i) if MONEY_FIELDS.contains(&key.as_str()) => i.to_string(),
            Bson::Document(nested) => {
                money_to_decimal128(nested)?;
                continue;
            }
            Bson::Array(items) => {
                for item in items.iter_mut() {
                    if let Bson::Document(nested) = item {
                        money_to_decimal128(nested)?;
                    }
                }
                continue;
            }
            _ => continue,
        };
        let amount = Decimal::from_str(&number)
            .map_err(|e| anyhow!("Invalid amount {} in field {}: {}", number, key, e))?;
        *value = decimal_bson(amount);
    }
    Ok(())
}

fn decimal128_to_double(value: &mut Bson) -> Result<()> {
    match value {
        Bson::Decimal128(d) => {
            let amount = decimal_from_bson(d)
                .and_then(|amount| amount.to_f64())
                .ok_or_else(|| anyhow!("Unsupported Decimal128 value {:?}", d))?;
            *value = Bson::Double(amount);
        }
        Bson::Document(doc) => {
            for (_, nested) in doc.iter_mut() {
                decimal128_to_double(nested)?;
            }
        }
        Bson::Array(items) => {
            for item in items.iter_mut() {
                decimal128_to_double(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    let json =
        serde_json::to_value(value).map_err(|e| anyhow!("Failed to serialize record: {}", e))?;
    json_to_document(json)
}

fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(document_to_json(doc)?)
        .map_err(|e| anyhow!("Failed to deserialize record from document: {}", e))
}

fn from_documents<T: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<T>> {
    docs.into_iter().map(from_document).collect()
}

fn to_bson<T: Serialize>(value: &T) -> Result<Bson> {
    let json =
        serde_json::to_value(value).map_err(|e| anyhow!("Failed to serialize value: {}", e))?;
    mongodb::bson::to_bson(&json).map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))
}

/// Convert a UUID to its BSON string representation for queries.
fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn now_bson() -> Result<Bson> {
    to_bson(&Utc::now())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Storage backed by a MongoDB database.
///
/// # Example
///
/// ```rust,ignore
/// let store = MongoStore::connect("mongodb://localhost:27017", "feasthub", false).await?;
/// let storage = Storage::from_store(store);
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
    transactions: bool,
}

impl MongoStore {
    /// Create a new `MongoStore` with the given database handle.
    pub fn new(database: Database, transactions: bool) -> Self {
        Self {
            database,
            transactions,
        }
    }

    /// Connect, select the database and create indexes
    pub async fn connect(uri: &str, database: &str, transactions: bool) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| anyhow!("Failed to connect to MongoDB: {}", e))?;
        let store = Self::new(client.database(database), transactions);
        store.ensure_indexes().await?;
        tracing::info!(database, transactions, "connected to MongoDB");
        Ok(store)
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection<T: Entity>(&self) -> Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn carts(&self) -> Collection<Document> {
        self.database.collection("carts")
    }

    /// Create the indexes every query relies on.
    ///
    /// This method is idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<Order>()
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "orderCode": 1 })
                    .options(unique())
                    .build(),
                IndexModel::builder().keys(doc! { "user": 1 }).build(),
                IndexModel::builder().keys(doc! { "restaurant": 1 }).build(),
                IndexModel::builder().keys(doc! { "statsApplied": 1 }).build(),
            ])
            .await
            .map_err(|e| anyhow!("Failed to create indexes on orders: {}", e))?;

        self.collection::<User>()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create indexes on users: {}", e))?;

        self.collection::<Restaurant>()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "owner": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create indexes on restaurants: {}", e))?;

        self.collection::<Dish>()
            .create_index(IndexModel::builder().keys(doc! { "restaurant": 1 }).build())
            .await
            .map_err(|e| anyhow!("Failed to create indexes on dishes: {}", e))?;

        self.collection::<CustomOrder>()
            .create_indexes(vec![
                IndexModel::builder().keys(doc! { "user": 1 }).build(),
                IndexModel::builder().keys(doc! { "restaurant": 1 }).build(),
            ])
            .await
            .map_err(|e| anyhow!("Failed to create indexes on custom_orders: {}", e))?;

        Ok(())
    }

    async fn find_many<T: Entity + DeserializeOwned>(&self, filter: Document) -> Result<Vec<T>> {
        let docs: Vec<Document> = self
            .collection::<T>()
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", T::resource_name(), e))?
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;
        from_documents(docs)
    }

    async fn find_by_id<T: Entity + DeserializeOwned>(&self, id: &Uuid) -> Result<Option<T>> {
        self.collection::<T>()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", T::resource_name_singular(), e))?
            .map(from_document)
            .transpose()
    }

    /// `findOneAndUpdate` returning the updated record
    async fn update_returning<T: Entity + DeserializeOwned>(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<T>> {
        self.collection::<T>()
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", T::resource_name_singular(), e))?
            .map(from_document)
            .transpose()
    }

    async fn insert<T: Entity + Serialize>(&self, record: &T) -> Result<()> {
        self.collection::<T>()
            .insert_one(to_document(record)?)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", T::resource_name_singular(), e))?;
        Ok(())
    }

    fn stats_increment(order: &Order) -> Result<Document> {
        Ok(doc! {
            "$inc": {
                "totalOrders": 1_i64,
                "totalRevenue": decimal_bson(order.total_price),
            },
            "$set": { "updatedAt": now_bson()? },
        })
    }

    async fn place_in_transaction(&self, mut order: Order) -> Result<Placement> {
        let mut session: ClientSession = self
            .database
            .client()
            .start_session()
            .await
            .map_err(|e| anyhow!("Failed to start session: {}", e))?;
        session
            .start_transaction()
            .await
            .map_err(|e| anyhow!("Failed to start transaction: {}", e))?;

        order.stats_applied = true;
        let inserted = self
            .collection::<Order>()
            .insert_one(to_document(&order)?)
            .session(&mut session)
            .await;
        if let Err(e) = inserted {
            let _ = session.abort_transaction().await;
            if is_duplicate_key(&e) {
                return Ok(Placement::CodeTaken);
            }
            return Err(anyhow!("Failed to create order: {}", e));
        }

        let updated = self
            .collection::<Restaurant>()
            .update_one(
                doc! { "_id": uuid_bson(&order.restaurant) },
                Self::stats_increment(&order)?,
            )
            .session(&mut session)
            .await;
        match updated {
            Ok(result) if result.matched_count == 1 => {}
            Ok(_) => {
                let _ = session.abort_transaction().await;
                return Ok(Placement::RestaurantMissing);
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                return Err(anyhow!("Failed to update restaurant stats: {}", e));
            }
        }

        session
            .commit_transaction()
            .await
            .map_err(|e| anyhow!("Failed to commit order transaction: {}", e))?;
        Ok(Placement::Placed(order))
    }

    async fn place_then_apply(&self, mut order: Order) -> Result<Placement> {
        if self
            .find_by_id::<Restaurant>(&order.restaurant)
            .await?
            .is_none()
        {
            return Ok(Placement::RestaurantMissing);
        }

        order.stats_applied = false;
        if let Err(e) = self
            .collection::<Order>()
            .insert_one(to_document(&order)?)
            .await
        {
            if is_duplicate_key(&e) {
                return Ok(Placement::CodeTaken);
            }
            return Err(anyhow!("Failed to create order: {}", e));
        }

        match self.claim_and_increment(&order).await {
            Ok(_) => {
                order.stats_applied = true;
                Ok(Placement::Placed(order))
            }
            Err(e) => Ok(Placement::StatsDeferred {
                order,
                reason: format!("{:#}", e),
            }),
        }
    }

    /// Set `statsApplied`, then `$inc` the restaurant. The flag is released
    /// again when the increment does not land.
    async fn claim_and_increment(&self, order: &Order) -> Result<bool> {
        let orders = self.collection::<Order>();
        let id = uuid_bson(&order.id);

        let claimed = orders
            .update_one(
                doc! { "_id": &id, "statsApplied": false },
                doc! { "$set": { "statsApplied": true } },
            )
            .await
            .map_err(|e| anyhow!("Failed to claim order stats: {}", e))?;
        if claimed.modified_count == 0 {
            return Ok(false);
        }

        let increment = self
            .collection::<Restaurant>()
            .update_one(
                doc! { "_id": uuid_bson(&order.restaurant) },
                Self::stats_increment(order)?,
            )
            .await;
        let failure = match increment {
            Ok(result) if result.matched_count == 1 => return Ok(true),
            Ok(_) => anyhow!("Restaurant {} not found", order.restaurant),
            Err(e) => anyhow!("Failed to update restaurant stats: {}", e),
        };

        if let Err(e) = orders
            .update_one(
                doc! { "_id": &id },
                doc! { "$set": { "statsApplied": false } },
            )
            .await
        {
            tracing::error!(order_id = %order.id, error = %e, "failed to release stats claim");
        }
        Err(failure)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn create(&self, mut user: User) -> Result<Outcome<User>> {
        user.email = normalize_email(&user.email);
        match self
            .collection::<User>()
            .insert_one(to_document(&user)?)
            .await
        {
            Ok(_) => Ok(Outcome::Done(user)),
            Err(e) if is_duplicate_key(&e) => Ok(Outcome::Duplicate),
            Err(e) => Err(anyhow!("Failed to create user: {}", e)),
        }
    }

    async fn get(&self, id: &Uuid) -> Result<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.collection::<User>()
            .find_one(doc! { "email": normalize_email(email) })
            .await
            .map_err(|e| anyhow!("Failed to get user: {}", e))?
            .map(from_document)
            .transpose()
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let filter = match role {
            Some(role) => doc! { "role": role.as_str() },
            None => doc! {},
        };
        self.find_many(filter).await
    }

    async fn update(&self, id: &Uuid, mut patch: UserPatch) -> Result<Outcome<User>> {
        patch.email = patch.email.as_deref().map(normalize_email);
        let mut set = to_document(&patch)?;
        set.insert("updatedAt", now_bson()?);

        let result = self
            .collection::<User>()
            .find_one_and_update(doc! { "_id": uuid_bson(id) }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await;
        match result {
            Ok(Some(doc)) => Ok(Outcome::Done(from_document(doc)?)),
            Ok(None) => Ok(Outcome::Missing),
            Err(e) if is_duplicate_key(&e) => Ok(Outcome::Duplicate),
            Err(e) => Err(anyhow!("Failed to update user: {}", e)),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection::<User>()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete user: {}", e))?;
        self.carts()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete cart: {}", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self, role: Option<Role>) -> Result<u64> {
        let filter = match role {
            Some(role) => doc! { "role": role.as_str() },
            None => doc! {},
        };
        self.collection::<User>()
            .count_documents(filter)
            .await
            .map_err(|e| anyhow!("Failed to count users: {}", e))
    }
}

#[async_trait]
impl CatalogStore for MongoStore {
    async fn create_restaurant(&self, restaurant: Restaurant) -> Result<Outcome<Restaurant>> {
        match self
            .collection::<Restaurant>()
            .insert_one(to_document(&restaurant)?)
            .await
        {
            Ok(_) => Ok(Outcome::Done(restaurant)),
            Err(e) if is_duplicate_key(&e) => Ok(Outcome::Duplicate),
            Err(e) => Err(anyhow!("Failed to create restaurant: {}", e)),
        }
    }

    async fn get_restaurant(&self, id: &Uuid) -> Result<Option<Restaurant>> {
        self.find_by_id(id).await
    }

    async fn restaurant_by_owner(&self, owner: &Uuid) -> Result<Option<Restaurant>> {
        self.collection::<Restaurant>()
            .find_one(doc! { "owner": uuid_bson(owner) })
            .await
            .map_err(|e| anyhow!("Failed to get restaurant: {}", e))?
            .map(from_document)
            .transpose()
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        self.find_many(doc! {}).await
    }

    async fn update_restaurant_profile(
        &self,
        id: &Uuid,
        profile: RestaurantProfile,
    ) -> Result<Option<Restaurant>> {
        let mut set = to_document(&profile)?;
        set.insert("updatedAt", now_bson()?);
        self.update_returning(doc! { "_id": uuid_bson(id) }, doc! { "$set": set })
            .await
    }

    async fn count_restaurants(&self) -> Result<u64> {
        self.collection::<Restaurant>()
            .count_documents(doc! {})
            .await
            .map_err(|e| anyhow!("Failed to count restaurants: {}", e))
    }

    async fn create_dish(&self, dish: Dish) -> Result<Dish> {
        self.insert(&dish).await?;
        Ok(dish)
    }

    async fn get_dish(&self, id: &Uuid) -> Result<Option<Dish>> {
        self.find_by_id(id).await
    }

    async fn get_dishes(&self, ids: &[Uuid]) -> Result<Vec<Dish>> {
        let ids: Vec<Bson> = ids.iter().map(uuid_bson).collect();
        self.find_many(doc! { "_id": { "$in": ids } }).await
    }

    async fn dishes_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<Dish>> {
        self.find_many(doc! { "restaurant": uuid_bson(restaurant) })
            .await
    }

    async fn update_dish(&self, id: &Uuid, patch: DishPatch) -> Result<Option<Dish>> {
        let mut set = to_document(&patch)?;
        set.insert("updatedAt", now_bson()?);
        self.update_returning(doc! { "_id": uuid_bson(id) }, doc! { "$set": set })
            .await
    }

    async fn delete_dish(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection::<Dish>()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete dish: {}", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn sample_dishes(&self, size: usize) -> Result<Vec<Dish>> {
        let docs: Vec<Document> = self
            .collection::<Dish>()
            .aggregate(vec![doc! { "$sample": { "size": size as i64 } }])
            .await
            .map_err(|e| anyhow!("Failed to sample dishes: {}", e))?
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect dishes: {}", e))?;
        from_documents(docs)
    }
}

#[derive(serde::Deserialize)]
struct CartDocument {
    #[serde(default)]
    lines: Vec<CartLine>,
}

#[async_trait]
impl CartStore for MongoStore {
    async fn lines(&self, user: &Uuid) -> Result<Vec<CartLine>> {
        let cart: Option<CartDocument> = self
            .carts()
            .find_one(doc! { "_id": uuid_bson(user) })
            .await
            .map_err(|e| anyhow!("Failed to get cart: {}", e))?
            .map(from_document)
            .transpose()?;
        Ok(cart.map(|c| c.lines).unwrap_or_default())
    }

    async fn add_item(&self, user: &Uuid, dish: &Uuid, quantity: u32) -> Result<Vec<CartLine>> {
        let carts = self.carts();
        let user_id = uuid_bson(user);
        let dish_id = uuid_bson(dish);

        for _ in 0..CART_MERGE_ATTEMPTS {
            let merged = carts
                .update_one(
                    doc! { "_id": &user_id, "lines.dish": &dish_id },
                    doc! { "$inc": { "lines.$.quantity": quantity as i64 } },
                )
                .await
                .map_err(|e| anyhow!("Failed to update cart: {}", e))?;
            if merged.matched_count > 0 {
                return self.lines(user).await;
            }

            // No line for this dish yet; append, creating the cart if needed.
            // A concurrent append for the same dish makes the upsert collide
            // on `_id`, and the next round merges instead.
            let line = to_bson(&CartLine::new(*dish, quantity))?;
            let appended = carts
                .update_one(
                    doc! { "_id": &user_id, "lines.dish": { "$ne": &dish_id } },
                    doc! { "$push": { "lines": line } },
                )
                .upsert(true)
                .await;
            match appended {
                Ok(_) => return self.lines(user).await,
                Err(e) if is_duplicate_key(&e) => continue,
                Err(e) => return Err(anyhow!("Failed to update cart: {}", e)),
            }
        }

        Err(anyhow!(
            "Cart update for user {} did not settle after {} attempts",
            user,
            CART_MERGE_ATTEMPTS
        ))
    }

    async fn set_quantity(
        &self,
        user: &Uuid,
        line: &Uuid,
        quantity: i64,
    ) -> Result<Option<Vec<CartLine>>> {
        let filter = doc! { "_id": uuid_bson(user), "lines.id": uuid_bson(line) };
        let update = if quantity <= 0 {
            doc! { "$pull": { "lines": { "id": uuid_bson(line) } } }
        } else {
            doc! { "$set": { "lines.$.quantity": quantity.min(u32::MAX as i64) } }
        };

        let result = self
            .carts()
            .update_one(filter, update)
            .await
            .map_err(|e| anyhow!("Failed to update cart: {}", e))?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        self.lines(user).await.map(Some)
    }

    async fn clear(&self, user: &Uuid) -> Result<()> {
        self.carts()
            .delete_one(doc! { "_id": uuid_bson(user) })
            .await
            .map_err(|e| anyhow!("Failed to clear cart: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MongoStore {
    async fn place(&self, order: Order) -> Result<Placement> {
        if self.transactions {
            self.place_in_transaction(order).await
        } else {
            self.place_then_apply(order).await
        }
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        self.find_by_id(id).await
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>> {
        self.find_many(doc! { "user": uuid_bson(user) }).await
    }

    async fn list_by_restaurant(
        &self,
        restaurant: &Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let mut filter = doc! { "restaurant": uuid_bson(restaurant) };
        if let Some(status) = status {
            filter.insert("orderStatus", status.as_str());
        }
        self.find_many(filter).await
    }

    async fn list_for_partner(&self, partner: &Uuid) -> Result<Vec<Order>> {
        self.find_many(doc! {
            "$or": [
                { "orderStatus": OrderStatus::Ready.as_str() },
                {
                    "deliveryPartner": uuid_bson(partner),
                    "orderStatus": {
                        "$in": [OrderStatus::OnTheWay.as_str(), OrderStatus::Delivered.as_str()]
                    },
                },
            ]
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        self.find_many(doc! {}).await
    }

    async fn count(&self) -> Result<u64> {
        self.collection::<Order>()
            .count_documents(doc! {})
            .await
            .map_err(|e| anyhow!("Failed to count orders: {}", e))
    }

    async fn transition(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        partner: Option<Uuid>,
    ) -> Result<Option<Order>> {
        let mut set = doc! { "orderStatus": to.as_str(), "updatedAt": now_bson()? };
        if let Some(partner) = partner {
            set.insert("deliveryPartner", uuid_bson(&partner));
        }
        self.update_returning(
            doc! { "_id": uuid_bson(id), "orderStatus": from.as_str() },
            doc! { "$set": set },
        )
        .await
    }

    async fn mark_paid(&self, id: &Uuid) -> Result<Option<Order>> {
        self.update_returning(
            doc! { "_id": uuid_bson(id) },
            doc! { "$set": { "paymentStatus": "Paid", "updatedAt": now_bson()? } },
        )
        .await
    }

    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<Order>> {
        self.update_returning(
            doc! { "_id": uuid_bson(id) },
            doc! { "$set": { "paymentRef": payment_ref, "updatedAt": now_bson()? } },
        )
        .await
    }

    async fn unapplied_stats(&self) -> Result<Vec<Order>> {
        self.find_many(doc! { "statsApplied": false }).await
    }

    async fn apply_stats(&self, id: &Uuid) -> Result<bool> {
        let order: Order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Order {} not found", id))?;
        if order.stats_applied {
            return Ok(false);
        }
        self.claim_and_increment(&order).await
    }
}

#[async_trait]
impl CustomOrderStore for MongoStore {
    async fn create(&self, order: CustomOrder) -> Result<CustomOrder> {
        self.insert(&order).await?;
        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<CustomOrder>> {
        self.find_by_id(id).await
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<CustomOrder>> {
        self.find_many(doc! { "user": uuid_bson(user) }).await
    }

    async fn list_by_restaurant(&self, restaurant: &Uuid) -> Result<Vec<CustomOrder>> {
        self.find_many(doc! { "restaurant": uuid_bson(restaurant) })
            .await
    }

    async fn update_status(
        &self,
        id: &Uuid,
        update: CustomOrderUpdate,
    ) -> Result<Option<CustomOrder>> {
        let mut set = doc! { "status": update.status.as_str(), "updatedAt": now_bson()? };
        if let Some(price) = update.price {
            set.insert("price", decimal_bson(price));
        }
        if let Some(note) = update.restaurant_note {
            set.insert("restaurantNote", note);
        }
        self.update_returning(
            doc! { "_id": uuid_bson(id), "status": update.expected.as_str() },
            doc! { "$set": set },
        )
        .await
    }

    async fn mark_paid(&self, id: &Uuid) -> Result<Option<CustomOrder>> {
        self.update_returning(
            doc! { "_id": uuid_bson(id), "paymentStatus": "Pending" },
            doc! { "$set": { "paymentStatus": "Paid", "updatedAt": now_bson()? } },
        )
        .await
    }

    async fn set_payment_ref(&self, id: &Uuid, payment_ref: &str) -> Result<Option<CustomOrder>> {
        self.update_returning(
            doc! { "_id": uuid_bson(id) },
            doc! { "$set": { "paymentRef": payment_ref, "updatedAt": now_bson()? } },
        )
        .await
    }

    async fn link_order(&self, id: &Uuid, order_id: &Uuid) -> Result<Option<CustomOrder>> {
        self.update_returning(
            doc! { "_id": uuid_bson(id) },
            doc! { "$set": { "orderId": uuid_bson(order_id), "updatedAt": now_bson()? } },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal128_encoding_is_canonical() {
        let Bson::Decimal128(one) = decimal_bson(Decimal::ONE) else {
            panic!("expected Decimal128");
        };
        assert_eq!(
            one.bytes(),
            0x3040_0000_0000_0000_0000_0000_0000_0001u128.to_le_bytes()
        );
    }

    #[test]
    fn test_decimal128_keeps_cents_exact() {
        for amount in [
            Decimal::new(30, 2),
            Decimal::new(-12345, 3),
            Decimal::ZERO,
            Decimal::new(999_999_999, 2),
        ] {
            let Bson::Decimal128(encoded) = decimal_bson(amount) else {
                panic!("expected Decimal128");
            };
            assert_eq!(decimal_from_bson(&encoded), Some(amount));
        }
    }

    #[test]
    fn test_nan_is_not_a_decimal() {
        let nan = Decimal128::from_bytes((0b11111u128 << 122).to_le_bytes());
        assert_eq!(decimal_from_bson(&nan), None);
    }

    #[test]
    fn test_money_fields_round_trip_through_documents() {
        let json = serde_json::json!({
            "id": "abc",
            "totalPrice": 0.3,
            "basicItems": [{ "name": "Raita", "price": 30.5, "quantity": 2 }],
            "servings": 4,
        });
        let doc = json_to_document(json).unwrap();
        assert!(matches!(doc.get("totalPrice"), Some(Bson::Decimal128(_))));
        assert!(matches!(doc.get("servings"), Some(Bson::Int64(_) | Bson::Int32(_))));
        let line = doc.get_array("basicItems").unwrap()[0].as_document().unwrap();
        assert!(matches!(line.get("price"), Some(Bson::Decimal128(_))));

        let back = document_to_json(doc).unwrap();
        assert_eq!(back["id"], "abc");
        assert_eq!(back["totalPrice"], serde_json::json!(0.3));
        assert_eq!(back["basicItems"][0]["price"], serde_json::json!(30.5));
    }
}
