use crate::auth::{perm, AuthRouterExt, AuthenticatedUser};
use crate::entities::HomePageSettingsModel;
use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::services::homepage::{HeroSlideInput, UpdateSettingsInput, DEFAULT_SITE_NAME};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub fn homepage_routes() -> Router<AppState> {
    let admin = Router::new()
        .route("/", put(update_settings))
        .route("/hero-slides", post(add_hero_slide))
        .route("/hero-slides/:slide_id", put(update_hero_slide))
        .route("/hero-slides/:slide_id", delete(delete_hero_slide))
        .route("/nav-links", post(add_nav_link))
        .route("/nav-links/:index", delete(delete_nav_link))
        .with_permission(perm::HOMEPAGE_MANAGE);

    Router::new().route("/", get(get_settings)).merge(admin)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomePageResponse {
    pub site_name: String,
    pub logo: Option<String>,
    pub hero_slides: Value,
    pub nav_links: Value,
    pub featured_product_ids: Value,
    pub grid_product_ids: Value,
}

impl From<HomePageSettingsModel> for HomePageResponse {
    fn from(model: HomePageSettingsModel) -> Self {
        Self {
            site_name: model.site_name,
            logo: model.logo,
            hero_slides: model.hero_slides,
            nav_links: model.nav_links,
            featured_product_ids: model.featured_product_ids,
            grid_product_ids: model.grid_product_ids,
        }
    }
}

impl Default for HomePageResponse {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            logo: None,
            hero_slides: Value::Array(vec![]),
            nav_links: Value::Array(vec![]),
            featured_product_ids: Value::Array(vec![]),
            grid_product_ids: Value::Array(vec![]),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 120))]
    pub site_name: Option<String>,
    pub logo: Option<String>,
    pub featured_product_ids: Option<Vec<Uuid>>,
    pub grid_product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlideRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub subtitle: Option<String>,
    #[validate(length(min = 1))]
    pub image: String,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
}

impl From<HeroSlideRequest> for HeroSlideInput {
    fn from(req: HeroSlideRequest) -> Self {
        Self {
            title: req.title,
            subtitle: req.subtitle,
            image: req.image,
            cta_text: req.cta_text,
            cta_link: req.cta_link,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NavLinkRequest {
    #[validate(length(min = 1, max = 60))]
    pub label: String,
    #[validate(length(min = 1, max = 500))]
    pub url: String,
}

/// Storefront home page content
///
/// Falls back to an empty default layout when nothing has been configured.
#[utoipa::path(
    get,
    path = "/api/v1/homepage-settings",
    responses(
        (status = 200, description = "Home page content", body = crate::ApiResponse<HomePageResponse>)
    ),
    tag = "Homepage"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let settings = state
        .services
        .homepage
        .get_settings()
        .await
        .map_err(map_service_error)?;

    let response = settings
        .map(HomePageResponse::from)
        .unwrap_or_default();
    Ok(success_response(response))
}

/// Update home page settings
#[utoipa::path(
    put,
    path = "/api/v1/homepage-settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = crate::ApiResponse<HomePageResponse>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn update_settings(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let model = state
        .services
        .homepage
        .update_settings(
            user.id,
            UpdateSettingsInput {
                site_name: payload.site_name,
                logo: payload.logo,
                featured_product_ids: payload.featured_product_ids,
                grid_product_ids: payload.grid_product_ids,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}

/// Add a hero slide
#[utoipa::path(
    post,
    path = "/api/v1/homepage-settings/hero-slides",
    request_body = HeroSlideRequest,
    responses(
        (status = 200, description = "Slide added", body = crate::ApiResponse<HomePageResponse>)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn add_hero_slide(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<HeroSlideRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let model = state
        .services
        .homepage
        .add_hero_slide(user.id, payload.into())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}

/// Replace a hero slide
#[utoipa::path(
    put,
    path = "/api/v1/homepage-settings/hero-slides/{slide_id}",
    params(("slide_id" = Uuid, Path, description = "Slide id")),
    request_body = HeroSlideRequest,
    responses(
        (status = 200, description = "Slide updated", body = crate::ApiResponse<HomePageResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn update_hero_slide(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
    Json(payload): Json<HeroSlideRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let model = state
        .services
        .homepage
        .update_hero_slide(user.id, slide_id, payload.into())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}

/// Remove a hero slide
#[utoipa::path(
    delete,
    path = "/api/v1/homepage-settings/hero-slides/{slide_id}",
    params(("slide_id" = Uuid, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Slide removed", body = crate::ApiResponse<HomePageResponse>),
        (status = 404, description = "Not found", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn delete_hero_slide(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(slide_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .homepage
        .delete_hero_slide(user.id, slide_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}

/// Add a navigation link
#[utoipa::path(
    post,
    path = "/api/v1/homepage-settings/nav-links",
    request_body = NavLinkRequest,
    responses(
        (status = 200, description = "Link added", body = crate::ApiResponse<HomePageResponse>)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn add_nav_link(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<NavLinkRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let model = state
        .services
        .homepage
        .add_nav_link(user.id, payload.label, payload.url)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}

/// Remove a navigation link by position
#[utoipa::path(
    delete,
    path = "/api/v1/homepage-settings/nav-links/{index}",
    params(("index" = usize, Path, description = "Zero-based link position")),
    responses(
        (status = 200, description = "Link removed", body = crate::ApiResponse<HomePageResponse>),
        (status = 404, description = "No link at that position", body = crate::errors::ErrorBody)
    ),
    security(("Bearer" = [])),
    tag = "Homepage"
)]
pub async fn delete_nav_link(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let model = state
        .services
        .homepage
        .delete_nav_link(user.id, index)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(HomePageResponse::from(model)))
}
