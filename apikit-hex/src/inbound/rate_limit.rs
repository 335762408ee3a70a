//! Rate limiting middleware using Governor.
//!
//! Implements per-client rate limiting with a token bucket algorithm. Each
//! limited route owns one `RateLimiterState`; idle clients are dropped by
//! `cleanup`.

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};

use apikit_types::{ErrorBody, RateSpec, RateUnit};

/// Detail returned with every 429 response.
pub const RATE_LIMIT_DETAIL: &str = "You have exceeded the rate limit.";

/// Key used when no client address is known.
const ANONYMOUS_KEY: &str = "anonymous";

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiter state shared across requests to one route.
pub struct RateLimiterState {
    /// Per-client cells, keyed by client key
    limiter: KeyedLimiter,
    spec: RateSpec,
    clock: DefaultClock,
}

impl RateLimiterState {
    /// Creates a limiter allowing `spec.count()` requests per `spec.unit()`.
    ///
    /// The full count is available as a burst; afterwards one request is
    /// earned back every `unit / count`.
    pub fn new(spec: RateSpec) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota_for(&spec)),
            spec,
            clock: DefaultClock::default(),
        }
    }

    pub fn spec(&self) -> RateSpec {
        self.spec
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Checks if a request from `key` is allowed.
    /// Returns the time to wait before retrying when rate limited.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Forgets clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();

        let removed = before.saturating_sub(self.limiter.len());
        if removed > 0 {
            tracing::debug!(removed, limit = %self.spec, "Rate limiter cleanup");
        }
    }

    /// Start a background cleanup task.
    ///
    /// Runs `cleanup` once per rate window (at least every second) until the
    /// runtime shuts down.
    pub fn start_cleanup_task(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        let period = self.spec.window().max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            interval_timer.tick().await;
            loop {
                interval_timer.tick().await;
                limiter.cleanup();
            }
        });
    }
}

fn quota_for(spec: &RateSpec) -> Quota {
    let count = spec.count();
    match spec.unit() {
        RateUnit::Second => Quota::per_second(count),
        RateUnit::Minute => Quota::per_minute(count),
        RateUnit::Hour => Quota::per_hour(count),
        RateUnit::Day => Quota::with_period(spec.replenish_interval())
            .map(|quota| quota.allow_burst(count))
            .unwrap_or_else(|| Quota::per_hour(count)),
    }
}

/// Identifies the client: peer IP, else first `X-Forwarded-For` hop.
fn client_key(request: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(ANONYMOUS_KEY)
        .to_string()
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if let Err(wait) = limiter.check(&key) {
        let retry_after = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        tracing::info!(
            client = %key,
            path = %request.uri().path(),
            limit = %limiter.spec(),
            "Rate limit exceeded"
        );

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody::new(RATE_LIMIT_DETAIL)),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(request).await
}
