use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::{ErrorBody, RateLimitedBody, validation_message};
use crate::rate_limit::{Decision, now_millis};

// Failures talking to the hosted database
#[derive(Debug, Error)]
pub enum DbError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("database returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid database url: {0}")]
    InvalidUrl(String),

    #[error("count missing from Content-Range header")]
    MissingCount,

    #[error("insert into {0} returned no row")]
    EmptyInsert(&'static str),
}

// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error("{0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited(Decision),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(validation_message(&errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::RateLimited(decision) => return rate_limited_response(decision, now_millis()),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Bad Gateway",
                    "The data service is unavailable, try again later".to_string(),
                )
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found", "Resource not found".to_string()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "A valid admin token is required".to_string(),
            ),
        };

        let body = ErrorBody {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

// 429 with X-RateLimit-* and Retry-After
pub fn rate_limited_response(decision: Decision, now_ms: i64) -> Response {
    let retry_after = decision.retry_after_secs(now_ms);
    let body = RateLimitedBody {
        error: "Too Many Requests".to_string(),
        message: format!("Rate limit exceeded. Try again in {} seconds.", retry_after),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, decision.headers(), Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limited_response_shape() {
        let decision = Decision {
            allowed: false,
            remaining: 0,
            reset_time: 60_000,
            limit: 60,
        };
        let response = rate_limited_response(decision, 100);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers["retry-after"], "60");
        assert_eq!(headers["x-ratelimit-limit"], "60");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert_eq!(headers["x-ratelimit-reset"], "60000");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: RateLimitedBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.retry_after, 60);
        assert_eq!(body.error, "Too Many Requests");
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Database(DbError::MissingCount).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
