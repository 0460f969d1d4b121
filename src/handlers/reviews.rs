use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::review::ReviewStatus;
use crate::entities::ReviewModel;
use crate::handlers::common::{
    created_response, map_service_error, message_response, success_response, validate_input,
    Pagination, PaginationParams,
};
use crate::services::{
    json_strings,
    reviews::{
        AdminReviewListQuery, CreateReviewInput, ReviewStats, ReviewStatusTotals,
        UpdateReviewInput,
    },
};
use crate::{errors::ApiError, ApiResponse, AppState};
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

const DEFAULT_PAGE_SIZE: u64 = 10;
const ADMIN_PAGE_SIZE: u64 = 20;

pub fn reviews_routes() -> Router<AppState> {
    let moderation = Router::new()
        .route("/", get(admin_list_reviews))
        .route("/:id/moderate", put(moderate_review))
        .with_permission(perm::REVIEWS_MODERATE);

    let authenticated = Router::new()
        .route("/", post(create_review))
        .route("/my", get(my_reviews))
        .route("/:id", put(update_review))
        .route("/:id", delete(delete_review))
        .route("/:id/helpful", post(toggle_helpful))
        .route("/:id/report", post(report_review))
        .with_auth();

    Router::new()
        .route("/product/:product_id", get(product_reviews))
        .merge(authenticated)
        .merge(moderation)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub title: String,
    pub comment: String,
    pub status: ReviewStatus,
    pub verified_purchase: bool,
    pub admin_response: Option<Value>,
    pub helpful_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewModel> for ReviewResponse {
    fn from(model: ReviewModel) -> Self {
        Self {
            helpful_count: json_strings(&model.helpful_voters).len() as u64,
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            rating: model.rating,
            title: model.title,
            comment: model.comment,
            status: model.status,
            verified_purchase: model.verified_purchase,
            admin_response: model.admin_response,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub stats: ReviewStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub totals: ReviewStatusTotals,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HelpfulResponse {
    pub helpful_count: u64,
    pub is_helpful: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 4000))]
    pub comment: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 4000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReviewRequest {
    pub status: ReviewStatus,
    pub admin_response: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReviewFilterParams {
    pub status: Option<ReviewStatus>,
    pub search: Option<String>,
}

/// Approved reviews and rating stats for a product
#[utoipa::path(
    get,
    path = "/api/v1/reviews/product/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Reviews with rating distribution", body = crate::ApiResponse<ProductReviewsResponse>)
    ),
    tag = "Reviews"
)]
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(DEFAULT_PAGE_SIZE);
    let (page, stats) = state
        .services
        .reviews
        .product_reviews(product_id, limit, pagination.offset(limit))
        .await
        .map_err(map_service_error)?;

    let body = ProductReviewsResponse {
        reviews: page.reviews.into_iter().map(ReviewResponse::from).collect(),
        stats,
    };
    let envelope = ApiResponse::success(body)
        .with_pagination(Pagination::new(pagination.page, limit, page.total));
    Ok(axum::Json(envelope))
}

/// Submit a review
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review submitted for moderation", body = crate::ApiResponse<ReviewResponse>),
        (status = 400, description = "Already reviewed or invalid payload", body = crate::errors::ErrorBody),
        (status = 404, description = "Product not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let review = state
        .services
        .reviews
        .create_review(
            user.id,
            CreateReviewInput {
                product_id: payload.product_id,
                rating: payload.rating,
                title: payload.title,
                comment: payload.comment,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ReviewResponse::from(review)))
}

/// The caller's own reviews, any status
#[utoipa::path(
    get,
    path = "/api/v1/reviews/my",
    responses(
        (status = 200, description = "The caller's reviews", body = crate::ApiResponse<Vec<ReviewResponse>>)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn my_reviews(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let reviews = state
        .services
        .reviews
        .user_reviews(user.id)
        .await
        .map_err(map_service_error)?;
    let reviews: Vec<ReviewResponse> = reviews.into_iter().map(ReviewResponse::from).collect();
    Ok(success_response(reviews))
}

/// All reviews for moderation, with per-status totals
#[utoipa::path(
    get,
    path = "/api/v1/reviews",
    params(PaginationParams, ReviewFilterParams),
    responses(
        (status = 200, description = "Reviews with status totals", body = crate::ApiResponse<AdminReviewsResponse>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn admin_list_reviews(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<ReviewFilterParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = pagination.limit_or(ADMIN_PAGE_SIZE);
    let (page, totals) = state
        .services
        .reviews
        .admin_list(AdminReviewListQuery {
            status: filters.status,
            search: filters.search,
            limit,
            offset: pagination.offset(limit),
        })
        .await
        .map_err(map_service_error)?;

    let body = AdminReviewsResponse {
        reviews: page.reviews.into_iter().map(ReviewResponse::from).collect(),
        totals,
    };
    let envelope = ApiResponse::success(body)
        .with_pagination(Pagination::new(pagination.page, limit, page.total));
    Ok(axum::Json(envelope))
}

/// Edit the caller's review; it returns to moderation
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = crate::ApiResponse<ReviewResponse>),
        (status = 403, description = "Not the review owner", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn update_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let review = state
        .services
        .reviews
        .update_review(
            id,
            user.id,
            UpdateReviewInput {
                rating: payload.rating,
                title: payload.title,
                comment: payload.comment,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ReviewResponse::from(review)))
}

/// Approve or reject a review
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}/moderate",
    params(("id" = Uuid, Path, description = "Review id")),
    request_body = ModerateReviewRequest,
    responses(
        (status = 200, description = "Review moderated", body = crate::ApiResponse<ReviewResponse>),
        (status = 400, description = "Invalid moderation status", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn moderate_review(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateReviewRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let review = state
        .services
        .reviews
        .moderate_review(id, payload.status, payload.admin_response)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(ReviewResponse::from(review)))
}

/// Delete a review (owner or moderator)
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted", body = crate::ApiResponse<String>),
        (status = 403, description = "Not the review owner", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let is_moderator = user.has_permission(perm::REVIEWS_MODERATE);
    state
        .services
        .reviews
        .delete_review(id, user.id, is_moderator)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Review deleted successfully"))
}

/// Toggle the caller's helpful vote
#[utoipa::path(
    post,
    path = "/api/v1/reviews/{id}/helpful",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Vote recorded or withdrawn", body = crate::ApiResponse<HelpfulResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn toggle_helpful(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let toggle = state
        .services
        .reviews
        .toggle_helpful(id, user.id)
        .await
        .map_err(map_service_error)?;

    let message = if toggle.is_helpful {
        "Marked as helpful"
    } else {
        "Removed from helpful"
    };
    let body = ApiResponse {
        success: true,
        data: Some(HelpfulResponse {
            helpful_count: toggle.helpful_count,
            is_helpful: toggle.is_helpful,
        }),
        message: Some(message.to_string()),
        pagination: None,
    };
    Ok(axum::Json(body))
}

/// Report a review for moderator attention
#[utoipa::path(
    post,
    path = "/api/v1/reviews/{id}/report",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Report recorded", body = crate::ApiResponse<String>),
        (status = 400, description = "Already reported", body = crate::errors::ErrorBody),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Reviews"
)]
pub async fn report_review(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .reviews
        .report_review(id, user.id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Review reported"))
}
