//! Entity trait shared by every persisted document

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for all persisted records.
///
/// Every record has a UUID identity and creation / update timestamps. The
/// resource names drive collection naming in document stores and the
/// `entityType` reported in not-found errors.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name, used as the collection name (e.g. "orders")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g. "order")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Implement [`Entity`] for a struct with `id`, `created_at` and `updated_at`
/// fields.
///
/// ```rust,ignore
/// impl_entity!(Dish, "dishes", "dish");
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($type:ty, $plural:expr, $singular:expr) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }
        }
    };
}
