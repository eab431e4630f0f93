//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Malformed requests come back in the same shape as business errors

mod harness;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use feasthub::prelude::*;
use harness::*;
use serde_json::{Value, json};

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_not_found_returns_404() {
        assert_eq!(
            AppError::not_found("dish", Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_already_exists_returns_409() {
        let err = AppError::Entity(EntityError::AlreadyExists {
            entity_type: "user".to_string(),
            key: "email 'a@b.c'".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_family_returns_400() {
        let errors = [
            AppError::invalid("qty", "must be positive"),
            AppError::Validation(ValidationError::UnknownStatus {
                value: "lost".to_string(),
            }),
            AppError::Validation(ValidationError::InvalidTransition {
                from: "pending".to_string(),
                to: "delivered".to_string(),
            }),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_integrity_family_returns_409() {
        let errors = [
            AppError::Integrity(IntegrityError::StatsNotApplied {
                order_id: Uuid::new_v4(),
                order_code: "AB12CD".to_string(),
                message: "timeout".to_string(),
            }),
            AppError::Integrity(IntegrityError::CodeExhausted { attempts: 5 }),
            AppError::Integrity(IntegrityError::ConcurrentUpdate {
                entity_type: "order".to_string(),
                id: Uuid::new_v4(),
            }),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_upstream_returns_502() {
        let err: AppError = UpstreamError::PaymentProvider {
            message: "connection reset".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_into_response_uses_status_code() {
        let response = AppError::forbidden("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let cases: Vec<(AppError, &str)> = vec![
            (AppError::not_found("order", "x"), "ENTITY_NOT_FOUND"),
            (AppError::invalid("name", "empty"), "VALIDATION_ERROR"),
            (
                ValidationError::UnknownStatus {
                    value: "x".to_string(),
                }
                .into(),
                "UNKNOWN_STATUS",
            ),
            (
                AuthError::Unauthenticated {
                    message: "no identity".to_string(),
                }
                .into(),
                "UNAUTHORIZED",
            ),
            (AppError::forbidden("role"), "FORBIDDEN"),
            (
                IntegrityError::CodeExhausted { attempts: 3 }.into(),
                "ORDER_CODE_CONFLICT",
            ),
            (UpstreamError::NotConfigured.into(), "PAYMENT_PROVIDER_UNAVAILABLE"),
            (AppError::Internal("disk".to_string()), "INTERNAL_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(err.error_code(), code, "{:?}", err);
        }
    }
}

// =============================================================================
// Error Response Format Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_not_found_details() {
        let id = Uuid::new_v4();
        let response = AppError::not_found("order", id).to_response();

        assert_eq!(response.code, "ENTITY_NOT_FOUND");
        assert!(response.message.contains("not found"));
        let details = response.details.unwrap();
        assert_eq!(details["entityType"], "order");
        assert_eq!(details["id"], id.to_string());
    }

    #[test]
    fn test_stats_pending_details_carry_the_order() {
        let order_id = Uuid::new_v4();
        let response = AppError::Integrity(IntegrityError::StatsNotApplied {
            order_id,
            order_code: "ZX81AB".to_string(),
            message: "timeout".to_string(),
        })
        .to_response();

        let details = response.details.unwrap();
        assert_eq!(details["orderId"], order_id.to_string());
        assert_eq!(details["orderCode"], "ZX81AB");
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let response = AppError::Internal("mongo at 10.0.0.3 refused".to_string()).to_response();
        assert_eq!(response.message, "Internal server error");
        assert!(response.details.is_none());
    }

    #[test]
    fn test_upstream_detail_is_not_leaked() {
        let response: AppError = UpstreamError::PaymentProvider {
            message: "401 bad key rzp_live_x".to_string(),
        }
        .into();
        assert!(!response.to_response().message.contains("rzp_live_x"));
    }

    #[test]
    fn test_field_errors_are_listed() {
        let err = AppError::Validation(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "email".to_string(),
                message: "invalid format".to_string(),
            },
            FieldValidationError {
                field: "name".to_string(),
                message: "required".to_string(),
            },
        ]));
        let details = err.to_response().details.unwrap();
        assert_eq!(details["fields"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_anyhow_becomes_internal() {
        let err: AppError = anyhow::anyhow!("lock poisoned").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Request Rejection Tests
// =============================================================================

mod rejection_tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let h = harness();
        let response = h
            .server
            .post("/api/users")
            .content_type("application/json")
            .bytes("{ not json".into())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_id_in_path_is_a_validation_error() {
        let h = harness();
        let response = h
            .server
            .get("/api/orders/not-a-uuid")
            .as_actor(&Actor::customer())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_identity_headers_are_unauthorized() {
        let h = harness();
        let response = h
            .server
            .get("/api/orders/myorders")
            .add_header(
                axum::http::HeaderName::from_static("x-user-id"),
                axum::http::HeaderValue::from_static("42"),
            )
            .add_header(
                axum::http::HeaderName::from_static("x-user-role"),
                axum::http::HeaderValue::from_static("customer"),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_role_header_is_unauthorized() {
        let h = harness();
        let response = h
            .server
            .get("/api/orders/myorders")
            .add_header(
                axum::http::HeaderName::from_static("x-user-id"),
                axum::http::HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
            )
            .add_header(
                axum::http::HeaderName::from_static("x-user-role"),
                axum::http::HeaderValue::from_static("wizard"),
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let h = harness();
        let body: Value = h.server.get("/health").await.json();
        assert_eq!(body, json!({ "status": "ok", "service": "feasthub" }));
    }
}
