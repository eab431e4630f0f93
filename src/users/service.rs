//! User directory: registration, profiles and the admin views

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, AppResult, EntityError};
use crate::core::validation::validators::not_blank;
use crate::core::{Caller, Outcome};
use crate::model::{DirectoryStats, Role, User, UserPatch};
use crate::storage::Storage;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn email_taken(email: &str) -> AppError {
    EntityError::AlreadyExists {
        entity_type: "user".to_string(),
        key: format!("email '{}'", email.trim()),
    }
    .into()
}

#[derive(Clone)]
pub struct UserDirectory {
    storage: Storage,
}

impl UserDirectory {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Public sign-up. Admin accounts cannot be self-registered.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;
        let role = match request.role.as_deref() {
            None => Role::Customer,
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|message| AppError::invalid("role", message))?,
        };
        if role == Role::Admin {
            return Err(AppError::invalid("role", "admin accounts cannot be registered"));
        }

        let user = User::new(
            request.name.trim().to_string(),
            &request.email,
            request.phone.filter(|p| !p.trim().is_empty()),
            role,
        );
        match self.storage.users.create(user).await? {
            Outcome::Done(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "user registered");
                Ok(user)
            }
            Outcome::Duplicate => Err(email_taken(&request.email)),
            Outcome::Missing => Err(AppError::Internal("user insert reported missing".into())),
        }
    }

    pub async fn profile(&self, caller: &Caller) -> AppResult<User> {
        self.storage
            .users
            .get(&caller.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user", caller.user_id))
    }

    pub async fn update_profile(
        &self,
        caller: &Caller,
        request: UpdateProfileRequest,
    ) -> AppResult<User> {
        request.validate()?;
        let email = request.email.clone();
        let patch = UserPatch {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email,
            phone: request.phone,
        };
        match self.storage.users.update(&caller.user_id, patch).await? {
            Outcome::Done(user) => Ok(user),
            Outcome::Missing => Err(AppError::not_found("user", caller.user_id)),
            Outcome::Duplicate => Err(email_taken(email.as_deref().unwrap_or_default())),
        }
    }

    pub async fn list(&self, caller: &Caller, role: Option<&str>) -> AppResult<Vec<User>> {
        caller.require_admin()?;
        let role = role
            .filter(|r| !r.trim().is_empty())
            .map(|r| r.parse::<Role>().map_err(|m| AppError::invalid("role", m)))
            .transpose()?;
        Ok(self.storage.users.list(role).await?)
    }

    pub async fn stats(&self, caller: &Caller) -> AppResult<DirectoryStats> {
        caller.require_admin()?;
        let users = &self.storage.users;
        Ok(DirectoryStats {
            total_users: users.count(None).await?,
            restaurant_owners: users.count(Some(Role::Restaurant)).await?,
            delivery_partners: users.count(Some(Role::Delivery)).await?,
            total_restaurants: self.storage.catalog.count_restaurants().await?,
            total_orders: self.storage.orders.count().await?,
        })
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> AppResult<()> {
        caller.require_admin()?;
        if !self.storage.users.delete(&id).await? {
            return Err(AppError::not_found("user", id));
        }
        tracing::info!(user_id = %id, by = %caller.user_id, "user deleted");
        Ok(())
    }
}
