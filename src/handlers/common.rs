use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ApiResponse;

/// Hard ceiling on page size, regardless of what the client asks for.
pub const MAX_LIMIT: u64 = 100;

/// Standard success response: `{success: true, data}`.
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response.
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Success response with a message and no data, used by delete endpoints.
pub fn message_response(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::<()>::message(message.into())),
    )
        .into_response()
}

/// Deserializer distinguishing an absent field from an explicit `null`.
/// Pair with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`, a value gives `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Pagination query parameters for list operations. The per-resource
/// default page size is supplied by the handler via `limit_or`.
#[derive(Debug, Clone, Deserialize, Serialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
}

fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: None,
        }
    }
}

impl PaginationParams {
    /// Effective page size, clamped to `MAX_LIMIT`.
    pub fn limit_or(&self, default: u64) -> u64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }

    /// Zero-based row offset for the given page size.
    pub fn offset(&self, limit: u64) -> u64 {
        self.page.saturating_sub(1) * limit
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// List response: `{success: true, data, pagination}`.
pub fn paginated_response<T: Serialize>(
    data: Vec<T>,
    page: u64,
    limit: u64,
    total: u64,
) -> Response {
    let body = ApiResponse::success(data).with_pagination(Pagination::new(page, limit, total));
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 12, 0).pages, 0);
        assert_eq!(Pagination::new(1, 12, 12).pages, 1);
        assert_eq!(Pagination::new(1, 12, 13).pages, 2);
        assert_eq!(Pagination::new(2, 10, 95).pages, 10);
    }

    #[test]
    fn limit_is_clamped() {
        let params = PaginationParams {
            page: 1,
            limit: Some(10_000),
        };
        assert_eq!(params.limit_or(12), MAX_LIMIT);

        let params = PaginationParams {
            page: 1,
            limit: None,
        };
        assert_eq!(params.limit_or(12), 12);

        let params = PaginationParams {
            page: 1,
            limit: Some(0),
        };
        assert_eq!(params.limit_or(12), 1);
    }

    #[test]
    fn offset_is_zero_based() {
        let params = PaginationParams {
            page: 3,
            limit: Some(10),
        };
        assert_eq!(params.offset(10), 20);

        let params = PaginationParams {
            page: 0,
            limit: None,
        };
        assert_eq!(params.offset(12), 0);
    }
}
