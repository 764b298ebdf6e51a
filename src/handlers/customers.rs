use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use crate::db::Table;
use crate::error::ApiError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::models::CustomerCount;
use crate::rate_limit::derive_client_key;
use crate::state::AppState;

// Public customer count - the only rate limited route
pub async fn customer_count_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    REQUEST_TOTAL.inc();

    let client = derive_client_key(&headers);
    let decision = state.rate_limiter.check_limit(&client);

    if !decision.allowed {
        RATE_LIMITED_TOTAL.inc();
        tracing::warn!(client = %client, reset_time = decision.reset_time, "Rate limit exceeded");
        return Err(ApiError::RateLimited(decision));
    }

    // a failed lookup has already used up one slot of the quota
    let count = match state.db.count(Table::Customers).await {
        Ok(count) => count,
        Err(e) => {
            let mut response = ApiError::from(e).into_response();
            response.headers_mut().extend(decision.headers());
            return Ok(response);
        }
    };

    Ok((StatusCode::OK, decision.headers(), Json(CustomerCount { count })).into_response())
}
