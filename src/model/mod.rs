//! Persisted records of the ordering domain

pub mod cart;
pub mod custom_order;
pub mod dish;
pub mod order;
pub mod restaurant;
pub mod user;

pub use cart::{CartItemView, CartLine, CartView};
pub use custom_order::{CustomOrder, CustomOrderStatus, CustomOrderUpdate};
pub use dish::{Dish, DishPatch, Nutrition};
pub use order::{
    BasicItem, CompletedOrdersReport, DeliveryAddress, Order, OrderItem, OrderStatus,
    PaymentStatus, order_total,
};
pub use restaurant::{Restaurant, RestaurantProfile};
pub use user::{DirectoryStats, Role, User, UserPatch, normalize_email};
