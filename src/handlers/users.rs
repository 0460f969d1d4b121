use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::user::UserRole;
use crate::entities::UserModel;
use crate::handlers::common::{
    map_service_error, message_response, paginated_response, success_response, validate_input,
    PaginationParams,
};
use crate::services::users::{UpdateProfileInput, UserListQuery};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 20;

pub fn users_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user))
        .route("/:id/role", put(update_user_role))
        .route("/:id", delete(delete_user))
        .with_permission(perm::USERS_MANAGE);

    Router::new()
        .route("/sync", post(sync_user))
        .route("/me", get(my_profile))
        .route("/me", put(update_my_profile))
        .with_auth()
        .merge(admin)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub role: UserRole,
    pub profile_address: Option<Value>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            phone: model.phone,
            email_verified: model.email_verified,
            role: model.role,
            profile_address: model.profile_address,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub display_name: Option<String>,
    #[validate(length(min = 4, max = 20))]
    pub phone: Option<String>,
    pub profile_address: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

/// Sync the caller's account from their identity token
///
/// The account row is created or refreshed during authentication, so this
/// simply returns the current state.
#[utoipa::path(
    post,
    path = "/api/v1/users/sync",
    responses(
        (status = 200, description = "Synced account", body = crate::ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn sync_user(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .users
        .get_user(user.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserResponse::from(model)))
}

/// The caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = crate::ApiResponse<UserResponse>)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn my_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .users
        .get_user(user.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserResponse::from(model)))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = crate::ApiResponse<UserResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn update_my_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let model = state
        .services
        .users
        .update_profile(
            user.id,
            UpdateProfileInput {
                display_name: payload.display_name,
                phone: payload.phone,
                profile_address: payload.profile_address,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserResponse::from(model)))
}

/// List accounts
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationParams, UserFilterParams),
    responses(
        (status = 200, description = "Paginated account list", body = crate::ApiResponse<Vec<UserResponse>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn list_users(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<UserFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .users
        .list_users(UserListQuery {
            role: filters.role,
            search: filters.search,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let users: Vec<UserResponse> = page.users.into_iter().map(UserResponse::from).collect();
    Ok(paginated_response(
        users,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one account
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account", body = crate::ApiResponse<UserResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn get_user(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .users
        .get_user(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserResponse::from(model)))
}

/// Grant or revoke the admin role
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = crate::ApiResponse<UserResponse>),
        (status = 400, description = "Unknown role", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn update_user_role(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .users
        .update_role(id, payload.role)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(UserResponse::from(model)))
}

/// Delete an account here and at the identity provider
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account deleted", body = crate::ApiResponse<String>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .users
        .delete_user(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("User deleted successfully"))
}
