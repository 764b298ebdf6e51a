use std::sync::Arc;
use crate::db::Database;
use crate::rate_limit::RateLimiter;
// app's shared state

pub struct AppState {
    pub db: Arc<dyn Database>,
    pub rate_limiter: Arc<RateLimiter>, // per-process counters, see rate_limit.rs
    pub admin_token: Option<String>,    // None locks the admin routes
}
