//! Caller identity and role-based authorization
//!
//! Sessions are issued by an upstream gateway. This service only consumes the
//! resulting identity, which arrives as request headers:
//! - `X-User-Id`: the caller's UUID
//! - `X-User-Role`: one of `customer`, `restaurant`, `delivery`, `admin`
//!
//! Handlers take a [`Caller`], which rejects anonymous requests with 401.
//! Role checks go through [`AuthPolicy`].

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{AppError, AuthError};
use crate::model::Role;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: Uuid, role: Role },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            AuthContext::User {
                role: Role::Admin,
                ..
            }
        )
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthContext::User { role, .. } => Some(*role),
            AuthContext::Anonymous => None,
        }
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Any authenticated user
    Authenticated,

    /// User must have one of these roles
    HasRole(Vec<Role>),

    /// Admin only
    AdminOnly,
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Authenticated => !matches!(context, AuthContext::Anonymous),

            AuthPolicy::HasRole(required) => context.role().is_some_and(|r| required.contains(&r)),

            AuthPolicy::AdminOnly => context.is_admin(),
        }
    }

    /// Check the policy and turn a failure into 401 (anonymous) or 403
    pub fn require(&self, context: &AuthContext) -> Result<(), AppError> {
        if self.check(context) {
            return Ok(());
        }
        Err(match context {
            AuthContext::Anonymous => AuthError::Unauthenticated {
                message: "authentication required".to_string(),
            }
            .into(),
            AuthContext::User { role, .. } => {
                AppError::forbidden(format!("role '{}' is not allowed to do this", role))
            }
        })
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from request headers
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError>;
}

/// Trusts the identity headers set by the upstream gateway
pub struct HeaderAuthProvider;

#[async_trait]
impl AuthProvider for HeaderAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let Some(raw_id) = headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| AuthError::Unauthenticated {
                message: "malformed X-User-Id header".to_string(),
            })?;

        let role = headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::Unauthenticated {
                message: "missing X-User-Role header".to_string(),
            })?
            .parse::<Role>()
            .map_err(|message| AuthError::Unauthenticated { message })?;

        Ok(AuthContext::User { user_id, role })
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = Arc::<dyn AuthProvider>::from_ref(state);
        Ok(provider.extract_context(&parts.headers).await?)
    }
}

/// An authenticated caller. Extraction fails with 401 for anonymous requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require one of the given roles (403 otherwise)
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        AuthPolicy::HasRole(roles.to_vec()).require(&AuthContext::from(*self))
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        AuthPolicy::AdminOnly.require(&AuthContext::from(*self))
    }
}

impl From<Caller> for AuthContext {
    fn from(caller: Caller) -> Self {
        AuthContext::User {
            user_id: caller.user_id,
            role: caller.role,
        }
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<dyn AuthProvider>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthContext::from_request_parts(parts, state).await? {
            AuthContext::User { user_id, role } => Ok(Caller { user_id, role }),
            AuthContext::Anonymous => Err(AuthError::Unauthenticated {
                message: "missing X-User-Id header".to_string(),
            }
            .into()),
        }
    }
}
