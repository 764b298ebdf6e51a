use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use crate::db::Table;
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{Contact, Customer, DashboardSummary, NewCustomer};
use crate::state::AppState;
use validator::Validate;

// Bearer token check for the dashboard routes
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::Unauthorized);
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request");
        Err(ApiError::Unauthorized)
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, ApiError> {
    REQUEST_TOTAL.inc();
    let db = &state.db;

    let (customers, contacts, services, blog_posts) = tokio::try_join!(
        db.count(Table::Customers),
        db.count(Table::Contacts),
        db.count(Table::Services),
        db.count(Table::BlogPosts),
    )?;

    Ok(Json(DashboardSummary {
        customers,
        contacts,
        services,
        blog_posts,
    }))
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    REQUEST_TOTAL.inc();
    Ok(Json(state.db.list_customers().await?))
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    REQUEST_TOTAL.inc();
    payload.validate()?;

    let customer = state.db.create_customer(payload).await?;
    tracing::info!(customer_id = customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    REQUEST_TOTAL.inc();
    Ok(Json(state.db.list_contacts().await?))
}
