use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::category::CategoryStatus;
use crate::entities::CategoryModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, paginated_response, success_response,
    validate_input, PaginationParams,
};
use crate::services::categories::{
    CategoryListQuery, CreateCategoryInput, UpdateCategoryInput,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 20;

pub fn categories_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_category))
        .route("/:id", put(update_category))
        .route("/:id", delete(delete_category))
        .with_permission(perm::CATEGORIES_MANAGE);

    Router::new()
        .route("/", get(list_categories))
        .route("/slug/:slug", get(get_category_by_slug))
        .route("/:id", get(get_category))
        .merge(protected)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub status: CategoryStatus,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image: model.image,
            parent_id: model.parent_id,
            display_order: model.display_order,
            status: model.status,
            seo_title: model.seo_title,
            seo_description: model.seo_description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    /// Inline image payload or an already-hosted URL.
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: Option<i32>,
    pub status: Option<CategoryStatus>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    /// `null` detaches the category from its parent.
    #[serde(default, deserialize_with = "crate::handlers::common::double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub display_order: Option<i32>,
    pub status: Option<CategoryStatus>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryFilterParams {
    pub status: Option<CategoryStatus>,
    /// A parent category id, or the literal `null` for root categories.
    pub parent: Option<String>,
}

/// List categories ordered for display
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(PaginationParams, CategoryFilterParams),
    responses(
        (status = 200, description = "Paginated category list", body = crate::ApiResponse<Vec<CategoryResponse>>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<CategoryFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let parent = match filters.parent.as_deref() {
        None => None,
        Some("null") => Some(None),
        Some(raw) => {
            let id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("Invalid parent category id".into()))?;
            Some(Some(id))
        }
    };

    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let page = state
        .services
        .categories
        .list_categories(CategoryListQuery {
            status: filters.status,
            parent,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let categories: Vec<CategoryResponse> = page
        .categories
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(paginated_response(
        categories,
        pagination.page,
        limit,
        page.total,
    ))
}

/// Fetch one category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = crate::ApiResponse<CategoryResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CategoryResponse::from(category)))
}

/// Fetch a category by its URL slug
#[utoipa::path(
    get,
    path = "/api/v1/categories/slug/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = crate::ApiResponse<CategoryResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    tag = "Categories"
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category_by_slug(&slug)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(CategoryResponse::from(category)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = crate::ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let category = state
        .services
        .categories
        .create_category(CreateCategoryInput {
            name: payload.name.trim().to_string(),
            description: payload.description,
            image: payload.image,
            parent_id: payload.parent_id,
            display_order: payload.display_order,
            status: payload.status,
            seo_title: payload.seo_title,
            seo_description: payload.seo_description,
        })
        .await
        .map_err(map_service_error)?;

    Ok(created_response(CategoryResponse::from(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = crate::ApiResponse<CategoryResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let category = state
        .services
        .categories
        .update_category(
            id,
            UpdateCategoryInput {
                name: payload.name,
                description: payload.description,
                image: payload.image,
                parent_id: payload.parent_id,
                display_order: payload.display_order,
                status: payload.status,
                seo_title: payload.seo_title,
                seo_description: payload.seo_description,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(CategoryResponse::from(category)))
}

/// Delete a category without subcategories
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = crate::ApiResponse<String>),
        (status = 400, description = "Category still has subcategories", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .categories
        .delete_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Category deleted successfully"))
}
