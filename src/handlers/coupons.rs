use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::coupon::DiscountType;
use crate::entities::CouponModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, paginated_response, success_response,
    validate_input, PaginationParams,
};
use crate::services::coupons::{CreateCouponInput, UpdateCouponInput};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 20;

pub fn coupons_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/", post(create_coupon))
        .route("/", get(list_coupons))
        .route("/:id", get(get_coupon))
        .route("/:id", put(update_coupon))
        .route("/:id", delete(delete_coupon))
        .with_permission(perm::COUPONS_MANAGE);

    let validate = Router::new()
        .route("/validate", post(validate_coupon))
        .with_auth();

    validate.merge(admin)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponResponse {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CouponModel> for CouponResponse {
    fn from(model: CouponModel) -> Self {
        Self {
            id: model.id,
            code: model.code,
            description: model.description,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            min_order_amount: model.min_order_amount,
            max_discount_amount: model.max_discount_amount,
            usage_limit: model.usage_limit,
            usage_count: model.usage_count,
            starts_at: model.starts_at,
            expires_at: model.expires_at,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCouponRequest {
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub min_order_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub max_discount_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub usage_limit: Option<Option<i32>>,
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1))]
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponResponse {
    pub valid: bool,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount: Decimal,
}

/// Create a coupon
#[utoipa::path(
    post,
    path = "/api/v1/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = crate::ApiResponse<CouponResponse>),
        (status = 400, description = "Duplicate code or invalid payload", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn create_coupon(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let coupon = state
        .services
        .coupons
        .create_coupon(CreateCouponInput {
            code: payload.code,
            description: payload.description,
            discount_type: payload.discount_type,
            discount_value: payload.discount_value,
            min_order_amount: payload.min_order_amount,
            max_discount_amount: payload.max_discount_amount,
            usage_limit: payload.usage_limit,
            starts_at: payload.starts_at,
            expires_at: payload.expires_at,
            is_active: payload.is_active,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CouponResponse::from(coupon)))
}

/// List coupons, newest first
#[utoipa::path(
    get,
    path = "/api/v1/coupons",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated coupon list", body = crate::ApiResponse<Vec<CouponResponse>>)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn list_coupons(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .coupons
        .list_coupons(limit, pagination.offset(limit))
        .await
        .map_err(map_service_error)?;

    let coupons: Vec<CouponResponse> =
        page.coupons.into_iter().map(CouponResponse::from).collect();
    Ok(paginated_response(
        coupons,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one coupon
#[utoipa::path(
    get,
    path = "/api/v1/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon", body = crate::ApiResponse<CouponResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn get_coupon(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let coupon = state
        .services
        .coupons
        .get_coupon(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CouponResponse::from(coupon)))
}

/// Update a coupon
#[utoipa::path(
    put,
    path = "/api/v1/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = crate::ApiResponse<CouponResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn update_coupon(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let coupon = state
        .services
        .coupons
        .update_coupon(
            id,
            UpdateCouponInput {
                description: payload.description,
                discount_type: payload.discount_type,
                discount_value: payload.discount_value,
                min_order_amount: payload.min_order_amount,
                max_discount_amount: payload.max_discount_amount,
                usage_limit: payload.usage_limit,
                starts_at: payload.starts_at,
                expires_at: payload.expires_at,
                is_active: payload.is_active,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CouponResponse::from(coupon)))
}

/// Delete a coupon
#[utoipa::path(
    delete,
    path = "/api/v1/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon deleted", body = crate::ApiResponse<String>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn delete_coupon(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .coupons
        .delete_coupon(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Coupon deleted successfully"))
}

/// Check a coupon against a cart subtotal
#[utoipa::path(
    post,
    path = "/api/v1/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon is valid for the subtotal", body = crate::ApiResponse<ValidateCouponResponse>),
        (status = 400, description = "Invalid or inapplicable coupon", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let (coupon, discount) = state
        .services
        .coupons
        .validate_coupon(&payload.code, payload.subtotal)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ValidateCouponResponse {
        valid: true,
        code: coupon.code,
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        discount,
    }))
}
