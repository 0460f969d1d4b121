use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::entities::AddressModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, success_response, validate_input,
};
use crate::services::addresses::AddressInput;
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Address book endpoints, all scoped to the caller.
pub fn addresses_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses))
        .route("/", post(add_address))
        .route("/:id", put(update_address))
        .route("/:id", delete(delete_address))
        .route("/:id/default", put(set_default_address))
        .with_auth()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AddressModel> for AddressResponse {
    fn from(model: AddressModel) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            phone: model.phone,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 4, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 3, max = 12))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 60))]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl From<AddressRequest> for AddressInput {
    fn from(req: AddressRequest) -> Self {
        Self {
            full_name: req.full_name,
            phone: req.phone,
            line1: req.line1,
            line2: req.line2,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
            is_default: req.is_default,
        }
    }
}

/// The caller's saved addresses, default first
#[utoipa::path(
    get,
    path = "/api/v1/addresses",
    responses(
        (status = 200, description = "Saved addresses", body = crate::ApiResponse<Vec<AddressResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let addresses = state
        .services
        .addresses
        .list_addresses(user.id)
        .await
        .map_err(map_service_error)?;
    let addresses: Vec<AddressResponse> =
        addresses.into_iter().map(AddressResponse::from).collect();
    Ok(success_response(addresses))
}

/// Save a new address
#[utoipa::path(
    post,
    path = "/api/v1/addresses",
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address saved", body = crate::ApiResponse<AddressResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Addresses"
)]
pub async fn add_address(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<AddressRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let address = state
        .services
        .addresses
        .add_address(user.id, payload.into())
        .await
        .map_err(map_service_error)?;
    Ok(created_response(AddressResponse::from(address)))
}

/// Update a saved address
#[utoipa::path(
    put,
    path = "/api/v1/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address id")),
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Address updated", body = crate::ApiResponse<AddressResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Addresses"
)]
pub async fn update_address(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let address = state
        .services
        .addresses
        .update_address(id, user.id, payload.into())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(AddressResponse::from(address)))
}

/// Make one address the default
#[utoipa::path(
    put,
    path = "/api/v1/addresses/{id}/default",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status = 200, description = "Default address changed", body = crate::ApiResponse<AddressResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Addresses"
)]
pub async fn set_default_address(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let address = state
        .services
        .addresses
        .set_default(id, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(AddressResponse::from(address)))
}

/// Delete a saved address
#[utoipa::path(
    delete,
    path = "/api/v1/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status = 200, description = "Address deleted", body = crate::ApiResponse<String>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .addresses
        .delete_address(id, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Address deleted successfully"))
}
