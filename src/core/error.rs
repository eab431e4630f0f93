//! Typed error handling for FeastHub
//!
//! Every failure a handler can surface is one of the categories below. Each
//! category knows its HTTP status and a stable error code, so clients can
//! match on `code` instead of parsing messages.
//!
//! # Error Categories
//!
//! - [`EntityError`]: a referenced record is absent or already exists
//! - [`ValidationError`]: malformed or empty input, illegal transitions
//! - [`AuthError`]: missing identity or role mismatch
//! - [`IntegrityError`]: cross-record consistency problems (order stats,
//!   code collisions, lost compare-and-set races)
//! - [`UpstreamError`]: the payment provider failed or is unreachable
//!
//! Storage and other internal failures are folded into
//! [`AppError::Internal`]; their detail is logged, never sent to clients.
//!
//! # Example
//!
//! ```rust,ignore
//! let dish = catalog.get_dish(&id).await?.ok_or_else(|| {
//!     AppError::not_found("dish", id)
//! })?;
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for FeastHub
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity lookup / uniqueness errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Authentication and authorization errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Cross-record consistency errors
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Payment provider errors
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Storage or other internal failure (detail is logged, not returned)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Shorthand for an [`EntityError::NotFound`]
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        AppError::Entity(EntityError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
    }

    /// Shorthand for a single-field [`ValidationError`]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::FieldError {
            field: field.to_string(),
            message: message.into(),
        })
    }

    /// Shorthand for [`AuthError::Forbidden`]
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Auth(AuthError::Forbidden {
            message: message.into(),
        })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Entity(e) => e.status_code(),
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => e.status_code(),
            AppError::Integrity(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Entity(e) => e.error_code(),
            AppError::Validation(e) => e.error_code(),
            AppError::Auth(e) => e.error_code(),
            AppError::Integrity(e) => e.error_code(),
            AppError::Upstream(e) => e.error_code(),
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    ///
    /// Internal and upstream failures get a stable message; the underlying
    /// detail only goes to the log.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Upstream(_) => "Payment provider request failed".to_string(),
            other => other.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entityType": entity_type,
                    "id": id
                }))
            }
            AppError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            AppError::Validation(ValidationError::InvalidTransition { from, to }) => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            AppError::Integrity(IntegrityError::StatsNotApplied {
                order_id,
                order_code,
                ..
            }) => Some(serde_json::json!({
                "orderId": order_id,
                "orderCode": order_code
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Internal(detail) => tracing::error!(error = %detail, "internal error"),
            AppError::Upstream(e) => tracing::error!(error = %e, "upstream failure"),
            _ => tracing::debug!(code = self.error_code(), error = %self, "request rejected"),
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity lookups and uniqueness
#[derive(Debug, Error)]
pub enum EntityError {
    /// Entity was not found
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: String },

    /// Entity already exists (conflict on a unique key)
    #[error("{entity_type} with {key} already exists")]
    AlreadyExists { entity_type: String, key: String },
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::AlreadyExists { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field validation failure
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One field is invalid
    #[error("Invalid field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Several fields are invalid
    #[error("Validation failed: {}", format_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Request body is not valid JSON for the expected shape
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// Path or body identifier is not a UUID
    #[error("Invalid identifier: {value}")]
    InvalidId { value: String },

    /// Status string is not part of the workflow
    #[error("Unknown status '{value}'")]
    UnknownStatus { value: String },

    /// Transition is not an edge of the workflow graph
    #[error("Cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },
}

fn format_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ValidationError::UnknownStatus { .. } => "UNKNOWN_STATUS",
            _ => "VALIDATION_ERROR",
        }
    }
}

/// Flatten nested validator output into `path.to[0].field` entries
fn flatten_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldValidationError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| FieldValidationError {
                    field: path.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation_errors("", &errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.into())
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors related to caller identity
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable identity on the request
    #[error("Unauthorized: {message}")]
    Unauthenticated { message: String },

    /// Identity is known but not allowed to do this
    #[error("Forbidden: {message}")]
    Forbidden { message: String },
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated { .. } => "UNAUTHORIZED",
            AuthError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

// =============================================================================
// Integrity Errors
// =============================================================================

/// Cross-record consistency failures
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The order was persisted but its restaurant counters were not updated.
    /// The order stays flagged until reconciliation applies them.
    #[error("Order {order_code} was saved but restaurant stats are pending: {message}")]
    StatsNotApplied {
        order_id: Uuid,
        order_code: String,
        message: String,
    },

    /// No free order code after the configured number of attempts
    #[error("Could not allocate a unique order code after {attempts} attempts")]
    CodeExhausted { attempts: usize },

    /// A compare-and-set lost against a concurrent writer
    #[error("{entity_type} '{id}' was modified concurrently")]
    ConcurrentUpdate { entity_type: String, id: Uuid },
}

impl IntegrityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IntegrityError::StatsNotApplied { .. } => "ORDER_STATS_PENDING",
            IntegrityError::CodeExhausted { .. } => "ORDER_CODE_CONFLICT",
            IntegrityError::ConcurrentUpdate { .. } => "CONCURRENT_UPDATE",
        }
    }
}

// =============================================================================
// Upstream Errors
// =============================================================================

/// Payment provider failures
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider rejected the request or could not be reached
    #[error("Payment provider error: {message}")]
    PaymentProvider { message: String },

    /// No provider credentials are configured
    #[error("Payment provider is not configured")]
    NotConfigured,
}

impl UpstreamError {
    pub fn error_code(&self) -> &'static str {
        match self {
            UpstreamError::PaymentProvider { .. } => "PAYMENT_PROVIDER_ERROR",
            UpstreamError::NotConfigured => "PAYMENT_PROVIDER_UNAVAILABLE",
        }
    }
}

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(ValidationError::InvalidId {
            value: err.to_string(),
        })
    }
}

/// A specialized Result type for FeastHub operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_not_found_display_and_status() {
        let err = AppError::not_found("dish", "abc");
        assert!(err.to_string().contains("dish"));
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "name".to_string(),
                message: "required".to_string(),
            },
            FieldValidationError {
                field: "price".to_string(),
                message: "must be positive".to_string(),
            },
        ]);
        let display = err.to_string();
        assert!(display.contains("name"));
        assert!(display.contains("price"));
    }

    #[test]
    fn test_internal_error_is_redacted() {
        let err = AppError::Internal("mongo: connection reset by peer".to_string());
        let response = err.to_response();
        assert_eq!(response.code, "INTERNAL_ERROR");
        assert!(!response.message.contains("mongo"));
    }

    #[test]
    fn test_upstream_error_is_redacted() {
        let err = AppError::Upstream(UpstreamError::PaymentProvider {
            message: "401 bad key rzp_live_x".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.to_response().message.contains("rzp_live_x"));
    }

    #[test]
    fn test_stats_not_applied_carries_order_details() {
        let order_id = Uuid::new_v4();
        let err = AppError::Integrity(IntegrityError::StatsNotApplied {
            order_id,
            order_code: "AB12CD".to_string(),
            message: "timeout".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        let details = err.to_response().details.unwrap();
        assert_eq!(details["orderCode"], "AB12CD");
        assert_eq!(details["orderId"], order_id.to_string());
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::Unauthenticated {
                message: "missing".to_string()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("nope").status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("lock poisoned").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
