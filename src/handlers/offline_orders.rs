use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::order::OrderStatus;
use crate::entities::OfflineOrderModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, paginated_response, success_response,
    PaginationParams,
};
use crate::services::offline_orders::{CreateOfflineOrderInput, OfflineOrderListQuery};
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

const DEFAULT_PAGE_SIZE: u64 = 20;

/// Back-office only: orders taken over the counter or by phone.
pub fn offline_orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_offline_order))
        .route("/", get(list_offline_orders))
        .route("/:id", get(get_offline_order))
        .route("/:id/status", put(update_offline_order_status))
        .route("/:id", delete(delete_offline_order))
        .with_permission(perm::OFFLINE_ORDERS_MANAGE)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OfflineOrderResponse {
    pub id: Uuid,
    pub customer: Value,
    pub items: Value,
    pub shipping_address: Value,
    pub delivery_address: Value,
    pub payment: Value,
    pub amounts: Value,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OfflineOrderModel> for OfflineOrderResponse {
    fn from(model: OfflineOrderModel) -> Self {
        Self {
            id: model.id,
            customer: model.customer,
            items: model.items,
            shipping_address: model.shipping_address,
            delivery_address: model.delivery_address,
            payment: model.payment,
            amounts: model.amounts,
            status: model.status,
            notes: model.notes,
            created_by: model.created_by,
            source: model.source,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfflineOrderRequest {
    pub customer: Value,
    pub items: Value,
    pub shipping_address: Value,
    pub delivery_address: Value,
    pub payment: Value,
    pub amounts: Value,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOfflineOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OfflineOrderFilterParams {
    pub status: Option<OrderStatus>,
}

/// Record an offline order
#[utoipa::path(
    post,
    path = "/api/v1/offline-orders",
    request_body = CreateOfflineOrderRequest,
    responses(
        (status = 201, description = "Offline order created", body = crate::ApiResponse<OfflineOrderResponse>),
        (status = 400, description = "Missing required documents", body = crate::errors::ErrorBody),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Offline Orders"
)]
pub async fn create_offline_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOfflineOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .offline_orders
        .create_offline_order(
            &user.email,
            CreateOfflineOrderInput {
                customer: payload.customer,
                items: payload.items,
                shipping_address: payload.shipping_address,
                delivery_address: payload.delivery_address,
                payment: payload.payment,
                amounts: payload.amounts,
                notes: payload.notes,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(OfflineOrderResponse::from(order)))
}

/// List offline orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/offline-orders",
    params(PaginationParams, OfflineOrderFilterParams),
    responses(
        (status = 200, description = "Paginated offline order list", body = crate::ApiResponse<Vec<OfflineOrderResponse>>)
    ),
    security(("Bearer" = [])),
    tag = "Offline Orders"
)]
pub async fn list_offline_orders(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<OfflineOrderFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .offline_orders
        .list_offline_orders(OfflineOrderListQuery {
            status: filters.status,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let orders: Vec<OfflineOrderResponse> = page
        .orders
        .into_iter()
        .map(OfflineOrderResponse::from)
        .collect();
    Ok(paginated_response(
        orders,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one offline order
#[utoipa::path(
    get,
    path = "/api/v1/offline-orders/{id}",
    params(("id" = Uuid, Path, description = "Offline order id")),
    responses(
        (status = 200, description = "Offline order", body = crate::ApiResponse<OfflineOrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Offline Orders"
)]
pub async fn get_offline_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .offline_orders
        .get_offline_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OfflineOrderResponse::from(order)))
}

/// Update an offline order's status
#[utoipa::path(
    put,
    path = "/api/v1/offline-orders/{id}/status",
    params(("id" = Uuid, Path, description = "Offline order id")),
    request_body = UpdateOfflineOrderStatusRequest,
    responses(
        (status = 200, description = "Offline order updated", body = crate::ApiResponse<OfflineOrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Offline Orders"
)]
pub async fn update_offline_order_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOfflineOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .offline_orders
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OfflineOrderResponse::from(order)))
}

/// Delete an offline order
#[utoipa::path(
    delete,
    path = "/api/v1/offline-orders/{id}",
    params(("id" = Uuid, Path, description = "Offline order id")),
    responses(
        (status = 200, description = "Offline order deleted", body = crate::ApiResponse<String>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Offline Orders"
)]
pub async fn delete_offline_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .offline_orders
        .delete_offline_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Offline order deleted successfully"))
}
