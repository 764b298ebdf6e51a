use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("agency_api_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("agency_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref DB_LATENCY: Histogram = register_histogram!(
        "agency_db_latency_seconds",
        "Hosted database call latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("agency_rate_limit_keys", "Client keys currently tracked by the rate limiter").unwrap();
}
