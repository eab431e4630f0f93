//! Axum extractor for validated request bodies
//!
//! `Validated<T>` parses the JSON body into `T` and runs its
//! `validator::Validate` rules before the handler sees it.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::core::error::{AppError, ValidationError};

/// Axum extractor that deserializes and validates a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn add_dish(
///     caller: Caller,
///     Validated(payload): Validated<NewDishRequest>,
/// ) -> AppResult<Json<Dish>> {
///     // payload is already validated
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    /// Get the inner payload
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|e| {
            AppError::Validation(ValidationError::InvalidJson {
                message: e.body_text(),
            })
        })?;

        payload.validate()?;

        Ok(Validated(payload))
    }
}
