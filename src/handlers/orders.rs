use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::order::OrderStatus;
use crate::entities::OrderModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, paginated_response, success_response,
    validate_input, PaginationParams,
};
use crate::services::orders::{CreateOrderInput, OrderItemInput, OrderListQuery};
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

pub fn orders_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(admin_list_orders))
        .route("/:id/status", put(update_order_status))
        .with_permission(perm::ORDERS_MANAGE);

    Router::new()
        .route("/", post(create_order))
        .route("/my", get(my_orders))
        .route("/:id", get(get_order))
        .route("/:id/cancel", put(cancel_order))
        .route("/:id", delete(delete_order))
        .with_auth()
        .merge(admin)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub items: Value,
    pub address: Value,
    pub payment: Value,
    pub amounts: Value,
    pub coupon: Option<Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderModel> for OrderResponse {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            items: model.items,
            address: model.address,
            payment: model.payment,
            amounts: model.amounts,
            coupon: model.coupon,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Value,
    pub payment: Value,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderFilterParams {
    pub status: Option<OrderStatus>,
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid payload or insufficient stock", body = crate::errors::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .orders
        .create_order(
            user.id,
            CreateOrderInput {
                items: payload
                    .items
                    .into_iter()
                    .map(|i| OrderItemInput {
                        product_id: i.product_id,
                        quantity: i.quantity,
                    })
                    .collect(),
                shipping_address: payload.shipping_address,
                payment: payload.payment,
                coupon_code: payload.coupon_code,
                notes: payload.notes,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(OrderResponse::from(order)))
}

/// The caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/my",
    params(PaginationParams, OrderFilterParams),
    responses(
        (status = 200, description = "Paginated order list", body = crate::ApiResponse<Vec<OrderResponse>>)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<OrderFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .orders
        .list_orders(OrderListQuery {
            user_id: Some(user.id),
            status: filters.status,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let orders: Vec<OrderResponse> = page.orders.into_iter().map(OrderResponse::from).collect();
    Ok(paginated_response(
        orders,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one order by id
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderResponse::from(order)))
}

/// All orders, for back-office listing
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams, OrderFilterParams),
    responses(
        (status = 200, description = "Paginated order list", body = crate::ApiResponse<Vec<OrderResponse>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn admin_list_orders(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<OrderFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .orders
        .list_orders(OrderListQuery {
            user_id: None,
            status: filters.status,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let orders: Vec<OrderResponse> = page.orders.into_iter().map(OrderResponse::from).collect();
    Ok(paginated_response(
        orders,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Move an order through the fulfilment pipeline
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = crate::ApiResponse<OrderResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderResponse::from(order)))
}

/// Cancel the caller's own order before shipment
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = crate::ApiResponse<OrderResponse>),
        (status = 400, description = "Order can no longer be cancelled", body = crate::errors::ErrorBody),
        (status = 403, description = "Not the order owner", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .cancel_order(id, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderResponse::from(order)))
}

/// Delete a new or cancelled order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = crate::ApiResponse<String>),
        (status = 400, description = "Order is not deletable", body = crate::errors::ErrorBody),
        (status = 403, description = "Not the order owner", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .orders
        .delete_order(id, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Order deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_must_carry_at_least_one_item() {
        let payload: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [],
            "shippingAddress": {"city": "Pune"},
            "payment": {"method": "cod"}
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"productId": "550e8400-e29b-41d4-a716-446655440000", "quantity": 1}],
            "shippingAddress": {"city": "Pune"},
            "payment": {"method": "cod"}
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }
}
