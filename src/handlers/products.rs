use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::product::ProductStatus;
use crate::entities::ProductModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, paginated_response, success_response,
    validate_input, PaginationParams,
};
use crate::services::{
    json_strings, json_uuids,
    products::{
        current_price, discount_percentage, stock_status, CreateProductInput, ProductListQuery,
        UpdateProductInput,
    },
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const DEFAULT_PAGE_SIZE: u64 = 12;
const DEFAULT_SEARCH_LIMIT: u64 = 20;

fn validate_decimal_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("decimal_positive"));
    }
    Ok(())
}

pub fn products_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .with_permission(perm::PRODUCTS_MANAGE);

    Router::new()
        .route("/", get(list_products))
        .route("/search", get(search_products))
        .route("/category/:category_id", get(products_by_category))
        .route("/:id", get(get_product))
        .merge(protected)
}

/// Product as serialized to clients, with the derived pricing and stock
/// fields swapped in beside the stored ones.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub regular_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub current_price: Decimal,
    pub discount_percentage: i32,
    pub stock_quantity: i32,
    pub stock_status: String,
    pub status: ProductStatus,
    pub images: Vec<String>,
    pub category_ids: Vec<Uuid>,
    pub related_product_ids: Vec<Uuid>,
    pub tags: Vec<String>,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub sales_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductModel> for ProductResponse {
    fn from(model: ProductModel) -> Self {
        Self {
            current_price: current_price(model.regular_price, model.discounted_price),
            discount_percentage: discount_percentage(
                model.regular_price,
                model.discounted_price,
            ),
            stock_status: stock_status(model.stock_quantity).to_string(),
            images: json_strings(&model.images),
            category_ids: json_uuids(&model.category_ids),
            related_product_ids: json_uuids(&model.related_product_ids),
            tags: json_strings(&model.tags),
            id: model.id,
            sku: model.sku,
            name: model.name,
            short_description: model.short_description,
            long_description: model.long_description,
            regular_price: model.regular_price,
            discounted_price: model.discounted_price,
            stock_quantity: model.stock_quantity,
            status: model.status,
            delivery_info: model.delivery_info,
            returns_info: model.returns_info,
            seo_title: model.seo_title,
            seo_description: model.seo_description,
            sales_count: model.sales_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    #[validate(custom = "validate_decimal_positive")]
    pub regular_price: Decimal,
    pub discounted_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    pub status: Option<ProductStatus>,
    #[validate(length(min = 1))]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub related_product_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    #[validate(custom = "validate_decimal_positive")]
    pub regular_price: Option<Decimal>,
    /// `null` clears the discount; omitting the field keeps it.
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub discounted_price: Option<Option<Decimal>>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub status: Option<ProductStatus>,
    pub images: Option<Vec<String>>,
    pub category_ids: Option<Vec<Uuid>>,
    pub related_product_ids: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub delivery_info: Option<String>,
    pub returns_info: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductFilterParams {
    pub category: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
    pub sort: Option<String>,
    /// `asc` or `desc`; newest first by default.
    pub order: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<u64>,
}

/// List catalog products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductFilterParams),
    responses(
        (status = 200, description = "Paginated product list", body = crate::ApiResponse<Vec<ProductResponse>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<ProductFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let descending = !matches!(filters.order.as_deref(), Some("asc"));

    let page = state
        .services
        .products
        .list_products(ProductListQuery {
            category_id: filters.category,
            status: filters.status,
            search: filters.search,
            sort: filters.sort,
            descending,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> =
        page.products.into_iter().map(ProductResponse::from).collect();
    Ok(paginated_response(
        products,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Search products by name, description or SKU
#[utoipa::path(
    get,
    path = "/api/v1/products/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = crate::ApiResponse<Vec<ProductResponse>>),
        (status = 400, description = "Missing search term", body = crate::errors::ErrorBody)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Search term is required".into()));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, crate::handlers::common::MAX_LIMIT);

    let products = state
        .services
        .products
        .search_products(term, limit)
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> =
        products.into_iter().map(ProductResponse::from).collect();
    Ok(success_response(products))
}

/// Active products within one category
#[utoipa::path(
    get,
    path = "/api/v1/products/category/{category_id}",
    params(
        ("category_id" = Uuid, Path, description = "Category id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Products in the category", body = crate::ApiResponse<Vec<ProductResponse>>)
    ),
    tag = "Products"
)]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .products
        .list_by_category(category_id, limit, pagination.offset(limit))
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> =
        page.products.into_iter().map(ProductResponse::from).collect();
    Ok(paginated_response(
        products,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = crate::ApiResponse<ProductResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = crate::ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorBody),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(CreateProductInput {
            name: payload.name.trim().to_string(),
            sku: payload.sku,
            short_description: payload.short_description,
            long_description: payload.long_description,
            regular_price: payload.regular_price,
            discounted_price: payload.discounted_price,
            stock_quantity: payload.stock_quantity,
            status: payload.status,
            images: payload.images,
            category_ids: payload.category_ids,
            related_product_ids: payload.related_product_ids,
            tags: payload.tags,
            delivery_info: payload.delivery_info,
            returns_info: payload.returns_info,
            seo_title: payload.seo_title,
            seo_description: payload.seo_description,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = crate::ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .update_product(
            id,
            UpdateProductInput {
                name: payload.name,
                sku: payload.sku,
                short_description: payload.short_description,
                long_description: payload.long_description,
                regular_price: payload.regular_price,
                discounted_price: payload.discounted_price,
                stock_quantity: payload.stock_quantity,
                status: payload.status,
                images: payload.images,
                category_ids: payload.category_ids,
                related_product_ids: payload.related_product_ids,
                tags: payload.tags,
                delivery_info: payload.delivery_info,
                returns_info: payload.returns_info,
                seo_title: payload.seo_title,
                seo_description: payload.seo_description,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Delete a product and its stored media
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = crate::ApiResponse<String>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Product deleted successfully"))
}
