//! Path extractors that report malformed identifiers as validation errors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::core::error::{AppError, ValidationError};

/// The single `{id}` segment of a route, parsed as a UUID
///
/// Axum's plain `Path<Uuid>` answers malformed ids with a text/plain 400;
/// this one goes through [`AppError`] so the body has the usual shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub Uuid);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                AppError::Validation(ValidationError::InvalidId {
                    value: e.body_text(),
                })
            })?;

        Uuid::parse_str(&raw)
            .map(IdPath)
            .map_err(|_| AppError::Validation(ValidationError::InvalidId { value: raw }))
    }
}
