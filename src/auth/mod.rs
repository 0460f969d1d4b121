pub mod permissions;

use crate::clients::{IdentityClient, VerifiedIdentity};
use crate::entities::user::{self, UserRole};
use crate::errors::ErrorBody;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

pub use permissions::consts as perm;

/// Authenticated caller attached to the request after token verification.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub permissions: Vec<String>,
    /// True when granted by the configured admin email rather than the
    /// stored role
    pub admin_override: bool,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_admin(&self) -> bool {
        self.admin_override || self.role == UserRole::Admin
    }
}

/// Extractor alias used in handler signatures.
pub type AuthenticatedUser = AuthUser;

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Authentication service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Self::InsufficientPermissions => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            Self::ServiceUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service unavailable",
            ),
        };
        let body = ErrorBody {
            success: false,
            message: message.to_string(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Verifies bearer tokens and mirrors identities into the local users
/// table. Shared through request extensions by a layer installed in main.
pub struct AuthContext {
    db: Arc<DatabaseConnection>,
    identity: IdentityClient,
    admin_email: Option<String>,
}

impl AuthContext {
    pub fn new(
        db: Arc<DatabaseConnection>,
        identity: IdentityClient,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            db,
            identity,
            admin_email,
        }
    }

    fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .map(|admin| admin.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false)
    }

    /// Full authentication: verify the token with the provider, upsert the
    /// local user, and resolve permissions.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let identity = self
            .identity
            .verify_token(token)
            .await
            .map_err(|e| match e {
                crate::errors::ServiceError::Unauthorized(_) => AuthError::InvalidToken,
                other => AuthError::ServiceUnavailable(other.to_string()),
            })?;

        let record = self
            .upsert_identity(&identity)
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))?;

        let admin_override = self.is_admin_email(&record.email);
        let permissions = permissions::permissions_for(record.role, admin_override);

        Ok(AuthUser {
            id: record.id,
            subject: record.subject,
            email: record.email,
            display_name: record.display_name,
            role: record.role,
            permissions,
            admin_override,
        })
    }

    /// Idempotent mirror of the external identity: one upsert per request,
    /// at the authentication boundary. Handlers never create users.
    pub async fn upsert_identity(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<user::Model, sea_orm::DbErr> {
        let now = Utc::now();

        let existing = user::Entity::find()
            .filter(user::Column::Subject.eq(identity.subject.as_str()))
            .one(&*self.db)
            .await?;

        match existing {
            Some(found) => {
                let mut active: user::ActiveModel = found.into();
                active.email = Set(identity.email.clone());
                if let Some(name) = &identity.name {
                    active.display_name = Set(name.clone());
                }
                if identity.picture.is_some() {
                    active.avatar_url = Set(identity.picture.clone());
                }
                active.email_verified = Set(identity.email_verified);
                active.last_login_at = Set(Some(now));
                active.updated_at = Set(now);
                active.update(&*self.db).await
            }
            None => {
                debug!(subject = %identity.subject, "Mirroring new identity into users table");
                let active = user::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    subject: Set(identity.subject.clone()),
                    email: Set(identity.email.clone()),
                    display_name: Set(identity.name.clone().unwrap_or_default()),
                    avatar_url: Set(identity.picture.clone()),
                    phone: Set(identity.phone_number.clone()),
                    email_verified: Set(identity.email_verified),
                    role: Set(UserRole::User),
                    profile_address: Set(None),
                    last_login_at: Set(Some(now)),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(&*self.db).await
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware: validates the bearer token and attaches the
/// resolved `AuthUser` to request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_context = match request.extensions().get::<Arc<AuthContext>>() {
        Some(ctx) => ctx.clone(),
        None => {
            return AuthError::ServiceUnavailable("auth context not installed".into())
                .into_response();
        }
    };

    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return AuthError::MissingAuth.into_response(),
    };

    match auth_context.authenticate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Permission middleware: admins pass outright, everyone else needs the
/// named permission.
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if user.is_admin() {
        return Ok(next.run(request).await);
    }

    if !user.has_permission(&required_permission) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: UserRole, admin_override: bool) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            subject: "sub-1".into(),
            email: "u@example.com".into(),
            display_name: "U".into(),
            role,
            permissions: permissions::permissions_for(role, admin_override),
            admin_override,
        }
    }

    #[test]
    fn stored_admin_role_grants_admin() {
        let user = auth_user(UserRole::Admin, false);
        assert!(user.is_admin());
        assert!(user.has_permission(perm::PRODUCTS_MANAGE));
    }

    #[test]
    fn admin_email_override_grants_admin_despite_user_role() {
        let user = auth_user(UserRole::User, true);
        assert!(user.is_admin());
        assert!(user.has_permission(perm::REVIEWS_MODERATE));
    }

    #[test]
    fn plain_user_is_not_admin() {
        let user = auth_user(UserRole::User, false);
        assert!(!user.is_admin());
        assert!(!user.has_permission(perm::USERS_MANAGE));
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, "Basic creds".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
