use axum::http::{HeaderMap, HeaderName, HeaderValue};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use crate::metrics::RATE_LIMIT_KEYS;

// Requests admitted per client per window
pub const RATE_LIMIT_QUOTA: u32 = 60;
// Window length in milliseconds
pub const RATE_LIMIT_WINDOW_MS: i64 = 60_000;

// Used when no client address header is present
pub const FALLBACK_CLIENT_KEY: &str = "127.0.0.1";

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: i64, // epoch millis, fixed at window start
}

// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: i64,
    pub limit: u32,
}

impl Decision {
    // whole seconds until the window resets, rounded up
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_time - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000)
    }

    // X-RateLimit-* headers for this decision
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderValue::from(self.limit),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderValue::from(self.reset_time),
        );
        headers
    }
}

/// Fixed-window limiter keyed by client identifier.
///
/// One instance is built at startup and shared through `AppState`. Counters
/// live only in this process, so running several instances multiplies the
/// effective quota.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    quota: u32,
    window_ms: i64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_QUOTA, RATE_LIMIT_WINDOW_MS)
    }
}

impl RateLimiter {
    pub fn new(quota: u32, window_ms: i64) -> Self {
        Self {
            entries: DashMap::new(),
            quota,
            window_ms,
        }
    }

    // Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    pub fn check_limit(&self, key: &str) -> Decision {
        self.check_limit_at(key, now_millis())
    }

    // Admission check against an explicit clock reading.
    // The read-modify-write runs under the shard lock for `key`, so
    // concurrent callers for the same key are serialized.
    pub fn check_limit_at(&self, key: &str, now_ms: i64) -> Decision {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_time: now_ms + self.window_ms,
            });

        // window over..? start a new one
        if now_ms >= entry.reset_time {
            entry.count = 0;
            entry.reset_time = now_ms + self.window_ms;
        }

        if entry.count >= self.quota {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_time: entry.reset_time,
                limit: self.quota,
            };
        }

        entry.count += 1;
        Decision {
            allowed: true,
            remaining: self.quota - entry.count,
            reset_time: entry.reset_time,
            limit: self.quota,
        }
    }

    // drop every entry whose window has ended, returns how many went
    pub fn evict_expired(&self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_time > now_ms);
        before.saturating_sub(self.entries.len())
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// Client key from proxy headers: first x-forwarded-for hop, x-real-ip,
// cf-connecting-ip, then loopback. Nothing here is authenticated.
pub fn derive_client_key(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| header_str(headers, "x-real-ip"))
        .or_else(|| header_str(headers, "cf-connecting-ip"))
        .unwrap_or(FALLBACK_CLIENT_KEY)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// Sweeper - removes expired windows so the map doesn't grow forever
pub async fn expired_entry_sweeper(limiter: Arc<RateLimiter>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!(interval = ?sweep_interval, "Rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.evict_expired(now_millis());
        RATE_LIMIT_KEYS.set(limiter.tracked_keys() as f64);

        if removed > 0 {
            tracing::debug!(removed, tracked = limiter.tracked_keys(), "Evicted expired rate limit entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_quota_with_decreasing_remaining() {
        let limiter = RateLimiter::default();

        for n in 1..=RATE_LIMIT_QUOTA {
            let decision = limiter.check_limit_at("A", n as i64 - 1);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, RATE_LIMIT_QUOTA - n);
            assert_eq!(decision.reset_time, RATE_LIMIT_WINDOW_MS);
        }
    }

    #[test]
    fn rejects_over_quota_without_moving_reset_time() {
        let limiter = RateLimiter::new(3, 1_000);
        let first = limiter.check_limit_at("k", 500);
        limiter.check_limit_at("k", 600);
        limiter.check_limit_at("k", 700);

        let rejected = limiter.check_limit_at("k", 900);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.reset_time, first.reset_time);
        assert_eq!(rejected.reset_time, 1_500);

        // still rejected, still the same reset
        let again = limiter.check_limit_at("k", 1_499);
        assert!(!again.allowed);
        assert_eq!(again.reset_time, 1_500);
    }

    #[test]
    fn new_window_starts_at_reset_time() {
        let limiter = RateLimiter::new(2, 1_000);
        for t in 0..10 {
            limiter.check_limit_at("k", t);
        }

        let fresh = limiter.check_limit_at("k", 1_000);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 1);
        assert_eq!(fresh.reset_time, 2_000);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, 1_000);
        assert!(limiter.check_limit_at("a", 0).allowed);
        assert!(!limiter.check_limit_at("a", 1).allowed);

        let other = limiter.check_limit_at("b", 2);
        assert!(other.allowed);
        assert_eq!(other.remaining, 0);
    }

    #[test]
    fn empty_key_is_accepted() {
        let limiter = RateLimiter::default();
        assert!(limiter.check_limit_at("", 0).allowed);
    }

    #[test]
    fn full_minute_scenario() {
        let limiter = RateLimiter::default();

        let mut last = None;
        for t in 0..60 {
            let decision = limiter.check_limit_at("A", t);
            assert!(decision.allowed, "request at t={t} should pass");
            last = Some(decision);
        }
        assert_eq!(last.map(|d| d.remaining), Some(0));

        let rejected = limiter.check_limit_at("A", 100);
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_time, 60_000);
        assert_eq!(rejected.retry_after_secs(100), 60);

        let next = limiter.check_limit_at("A", 60_001);
        assert!(next.allowed);
        assert_eq!(next.remaining, 59);
        assert_eq!(next.reset_time, 120_001);
    }

    #[test]
    fn retry_after_rounds_up_and_never_goes_negative() {
        let decision = Decision {
            allowed: false,
            remaining: 0,
            reset_time: 10_000,
            limit: 60,
        };
        assert_eq!(decision.retry_after_secs(9_999), 1);
        assert_eq!(decision.retry_after_secs(8_000), 2);
        assert_eq!(decision.retry_after_secs(10_000), 0);
        assert_eq!(decision.retry_after_secs(12_000), 0);
    }

    #[test]
    fn decision_headers() {
        let decision = Decision {
            allowed: true,
            remaining: 12,
            reset_time: 1_700_000_000_000,
            limit: 60,
        };
        let headers = decision.headers();
        assert_eq!(headers["x-ratelimit-limit"], "60");
        assert_eq!(headers["x-ratelimit-remaining"], "12");
        assert_eq!(headers["x-ratelimit-reset"], "1700000000000");
    }

    #[test]
    fn eviction_only_removes_finished_windows() {
        let limiter = RateLimiter::new(5, 1_000);
        limiter.check_limit_at("old", 0);
        limiter.check_limit_at("new", 900);

        assert_eq!(limiter.evict_expired(1_000), 1);
        assert_eq!(limiter.tracked_keys(), 1);

        // the surviving key keeps its count
        let decision = limiter.check_limit_at("new", 1_100);
        assert_eq!(decision.remaining, 3);
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn forwarded_for_wins() {
        let map = headers(&[
            ("x-forwarded-for", "1.2.3.4, 5.6.7.8"),
            ("x-real-ip", "9.9.9.9"),
            ("cf-connecting-ip", "8.8.8.8"),
        ]);
        assert_eq!(derive_client_key(&map), "1.2.3.4");
    }

    #[test]
    fn falls_through_header_chain() {
        let map = headers(&[("x-real-ip", "9.9.9.9"), ("cf-connecting-ip", "8.8.8.8")]);
        assert_eq!(derive_client_key(&map), "9.9.9.9");

        let map = headers(&[("cf-connecting-ip", "8.8.8.8")]);
        assert_eq!(derive_client_key(&map), "8.8.8.8");

        assert_eq!(derive_client_key(&HeaderMap::new()), FALLBACK_CLIENT_KEY);
    }

    #[test]
    fn blank_forwarded_for_is_skipped() {
        let map = headers(&[("x-forwarded-for", " , 5.6.7.8"), ("x-real-ip", "9.9.9.9")]);
        assert_eq!(derive_client_key(&map), "9.9.9.9");
    }

    #[test]
    fn malformed_values_are_passed_through() {
        let map = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(derive_client_key(&map), "not-an-ip");
    }

    #[test]
    fn non_utf8_forwarded_for_falls_through() {
        let mut map = HeaderMap::new();
        map.insert("x-forwarded-for", HeaderValue::from_bytes(&[0xff]).unwrap());
        map.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(derive_client_key(&map), "9.9.9.9");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn parallel_checks_admit_exactly_quota() {
        let limiter = Arc::new(RateLimiter::default());

        let handles: Vec<_> = (0..500)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_limit_at("k", 10).allowed })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, RATE_LIMIT_QUOTA);

        let next = limiter.check_limit_at("k", 11);
        assert!(!next.allowed);
        assert_eq!(next.reset_time, 10 + RATE_LIMIT_WINDOW_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_on_each_tick() {
        let limiter = Arc::new(RateLimiter::default());
        // windows anchored at the epoch ended long ago
        limiter.check_limit_at("stale-1", 0);
        limiter.check_limit("live");

        let sweeper = tokio::spawn(expired_entry_sweeper(limiter.clone(), Duration::from_secs(30)));

        // first tick fires immediately
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(RATE_LIMIT_KEYS.get(), 1.0);

        limiter.check_limit_at("stale-2", 0);
        assert_eq!(limiter.tracked_keys(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(limiter.tracked_keys(), 1);
        assert!(limiter.check_limit("live").allowed);

        sweeper.abort();
    }
}
