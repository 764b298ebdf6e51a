mod admin;
mod contact;
mod content;
mod customers;
mod health;
mod metrics;

pub use admin::{admin_auth, create_customer, dashboard, list_contacts, list_customers};
pub use contact::contact_handler;
pub use content::{blog_post_handler, blog_posts_handler, services_handler};
pub use customers::customer_count_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::state::AppState;

// All routes, with the admin group behind the bearer check
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/customers", get(list_customers).post(create_customer))
        .route("/contacts", get(list_contacts))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/customers/count", get(customer_count_handler))
        .route("/api/services", get(services_handler))
        .route("/api/blog", get(blog_posts_handler))
        .route("/api/blog/{slug}", get(blog_post_handler))
        .route("/api/contact", post(contact_handler))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
