use crate::auth::{AuthRouterExt, AuthenticatedUser};
use crate::handlers::common::{map_service_error, message_response, success_response, validate_input};
use crate::services::{json_strings, products::current_price};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Every cart endpoint acts on the caller's own cart.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/:product_id", delete(remove_item))
        .with_auth()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub subtotal: Decimal,
}

impl From<crate::services::carts::CartView> for CartResponse {
    fn from(view: crate::services::carts::CartView) -> Self {
        let items: Vec<CartLineResponse> = view
            .lines
            .into_iter()
            .map(|line| {
                let price =
                    current_price(line.product.regular_price, line.product.discounted_price);
                CartLineResponse {
                    product_id: line.product.id,
                    name: line.product.name,
                    image: json_strings(&line.product.images).into_iter().next(),
                    price,
                    quantity: line.item.quantity,
                    line_total: price * Decimal::from(line.item.quantity),
                }
            })
            .collect();
        let subtotal = items.iter().map(|i| i.line_total).sum();
        Self { items, subtotal }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Fetch the caller's cart
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart contents", body = crate::ApiResponse<CartResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let view = state
        .services
        .carts
        .get_cart(user.id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CartResponse::from(view)))
}

/// Add a product to the cart, replacing the quantity if present
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = crate::ApiResponse<CartResponse>),
        (status = 400, description = "Invalid quantity or unavailable product", body = crate::errors::ErrorBody),
        (status = 404, description = "Product not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<AddCartItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let view = state
        .services
        .carts
        .add_item(user.id, payload.product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CartResponse::from(view)))
}

/// Remove one product line from the cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Updated cart", body = crate::ApiResponse<CartResponse>),
        (status = 404, description = "Cart or item not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let view = state
        .services
        .carts
        .remove_item(user.id, product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CartResponse::from(view)))
}

/// Empty the caller's cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart cleared", body = crate::ApiResponse<String>)
    ),
    security(("Bearer" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .carts
        .clear_cart(user.id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Cart cleared"))
}
