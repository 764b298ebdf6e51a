use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{Contact, NewContact};
use crate::state::AppState;
use validator::Validate;

// Lead capture - the contact form posts here
pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    REQUEST_TOTAL.inc();

    payload.validate()?;

    let contact = state.db.create_contact(payload).await?;
    tracing::info!(contact_id = contact.id, service = ?contact.service, "New lead captured");

    Ok((StatusCode::CREATED, Json(contact)))
}
