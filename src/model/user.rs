//! Users and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role carried by every user and by the request identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Restaurant,
    Delivery,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Delivery => "delivery",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "restaurant" => Ok(Role::Restaurant),
            "delivery" | "deliverypartner" | "delivery-partner" => Ok(Role::Delivery),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lower-cased; unique across users
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

crate::impl_entity!(User, "users", "user");

impl User {
    pub fn new(name: String, email: &str, phone: Option<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            phone,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Canonical form used for uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Counts reported on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total_users: u64,
    pub restaurant_owners: u64,
    pub delivery_partners: u64,
    pub total_restaurants: u64,
    pub total_orders: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_aliases() {
        assert_eq!("Customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("deliveryPartner".parse::<Role>().unwrap(), Role::Delivery);
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("Ana".into(), "  Ana@Example.COM ", None, Role::Customer);
        assert_eq!(user.email, "ana@example.com");
    }
}
