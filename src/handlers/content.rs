use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{BlogPost, Service};
use crate::state::AppState;

pub async fn services_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, ApiError> {
    REQUEST_TOTAL.inc();
    Ok(Json(state.db.list_services().await?))
}

pub async fn blog_posts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    REQUEST_TOTAL.inc();
    Ok(Json(state.db.list_published_posts().await?))
}

pub async fn blog_post_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    REQUEST_TOTAL.inc();
    state
        .db
        .find_post(&slug)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
