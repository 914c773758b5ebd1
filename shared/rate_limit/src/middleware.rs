//! Axum middleware for rate limiting

use crate::config::RateLimitConfig;
use crate::limiter::{KeyGenerator, RateLimitError, RateLimitResult, RateLimiter};
use crate::memory_limiter::InMemoryRateLimiter;
use crate::redis_limiter::RedisRateLimiter;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Request, Response, StatusCode};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::{debug, info, warn};

/// Rate limit endpoint type.
///
/// SafeGuard exposes one HTTP-wide limit. Per-account login abuse is handled
/// separately by [`crate::lockout::AccountLockout`], which is keyed by user
/// id rather than by route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitEndpoint {
    Global,
}

impl RateLimitEndpoint {
    /// Get the key prefix for this endpoint
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Global => "rate_limit:global:ip",
        }
    }
}

/// Shared rate limiter that can use either Redis or in-memory storage
#[derive(Clone)]
pub enum SharedRateLimiter {
    Redis(RedisRateLimiter),
    InMemory(InMemoryRateLimiter),
}

impl SharedRateLimiter {
    /// Create a new shared rate limiter based on configuration
    pub async fn from_config(config: &RateLimitConfig) -> Self {
        if let Some(redis_url) = &config.redis_url {
            match RedisRateLimiter::new(redis_url).await {
                Ok(limiter) => {
                    info!("Rate limiter using Redis backend");
                    return Self::Redis(limiter);
                },
                Err(e) => {
                    warn!(
                        "Failed to connect to Redis for rate limiting: {}. Falling back to in-memory.",
                        e
                    );
                },
            }
        }

        info!("Rate limiter using in-memory backend");
        Self::InMemory(InMemoryRateLimiter::new())
    }

    /// Check rate limit
    pub async fn check(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError> {
        match self {
            Self::Redis(limiter) => limiter.check_rate_limit(key, max_requests, window).await,
            Self::InMemory(limiter) => limiter.check_rate_limit(key, max_requests, window).await,
        }
    }

    /// Reset rate limit for a key
    pub async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        match self {
            Self::Redis(limiter) => limiter.reset(key).await,
            Self::InMemory(limiter) => limiter.reset(key).await,
        }
    }

    /// Get current count for a key
    pub async fn get_count(&self, key: &str) -> Result<u32, RateLimitError> {
        match self {
            Self::Redis(limiter) => limiter.get_count(key).await,
            Self::InMemory(limiter) => limiter.get_count(key).await,
        }
    }

    /// Get TTL for a key
    pub async fn get_ttl(&self, key: &str) -> Result<u64, RateLimitError> {
        match self {
            Self::Redis(limiter) => limiter.get_ttl(key).await,
            Self::InMemory(limiter) => limiter.get_ttl(key).await,
        }
    }

    /// Check if healthy
    pub async fn is_healthy(&self) -> bool {
        match self {
            Self::Redis(limiter) => limiter.is_healthy().await,
            Self::InMemory(limiter) => limiter.is_healthy().await,
        }
    }
}

/// Rate limit state for the middleware
#[derive(Clone)]
pub struct RateLimitState {
    /// The rate limiter implementation
    pub limiter: Arc<SharedRateLimiter>,
    /// Configuration
    pub config: RateLimitConfig,
}

impl RateLimitState {
    /// Create a new rate limit state
    pub async fn from_config(config: RateLimitConfig) -> Self {
        let limiter = SharedRateLimiter::from_config(&config).await;
        Self {
            limiter: Arc::new(limiter),
            config,
        }
    }

    /// Check rate limit for an endpoint, keyed by the caller's IP
    pub async fn check_endpoint(
        &self,
        endpoint: RateLimitEndpoint,
        ip: &str,
    ) -> Result<RateLimitResult, RateLimitError> {
        let (max_requests, window_seconds) = match endpoint {
            RateLimitEndpoint::Global => {
                (self.config.global_max_requests, self.config.global_window_seconds)
            },
        };

        let key = KeyGenerator::ip_key(endpoint.key_prefix(), ip);

        self.limiter
            .check(&key, max_requests, Duration::from_secs(window_seconds))
            .await
    }
}

/// Layer for applying rate limiting to routes
#[derive(Clone)]
pub struct RateLimitLayer {
    state: RateLimitState,
    endpoint: RateLimitEndpoint,
}

impl RateLimitLayer {
    /// Create a new rate limit layer for a specific endpoint
    pub fn new(state: RateLimitState, endpoint: RateLimitEndpoint) -> Self {
        Self { state, endpoint }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            state: self.state.clone(),
            endpoint: self.endpoint,
        }
    }
}

/// Rate limiting middleware
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    state: RateLimitState,
    endpoint: RateLimitEndpoint,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let endpoint = self.endpoint;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Skip rate limiting if disabled
            if !state.config.enabled {
                return inner.call(req).await;
            }

            let ip = extract_client_ip(&req);

            // Check if IP is trusted
            if state.config.is_trusted_ip(&ip) {
                debug!("Trusted IP {} bypassing rate limit", ip);
                return inner.call(req).await;
            }

            match state.check_endpoint(endpoint, &ip).await {
                Ok(result) if result.allowed => {
                    let response = inner.call(req).await?;
                    Ok(add_rate_limit_headers(response, &result))
                },
                Ok(result) => {
                    info!(
                        "Rate limit exceeded for {} on {:?}: {}/{} requests",
                        ip, endpoint, result.limit, result.limit
                    );
                    Ok(rate_limit_exceeded_response(&result))
                },
                Err(e) => {
                    // Log error but allow request (fail open for availability)
                    warn!("Rate limit check failed: {}. Allowing request.", e);
                    inner.call(req).await
                },
            }
        })
    }
}

/// Extract client IP from request (direct connection only; SafeGuard does
/// not sit behind a header-trusted reverse proxy in this deployment shape)
fn extract_client_ip<B>(req: &Request<B>) -> String {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }
    "unknown".to_string()
}

/// Add rate limit headers to response
fn add_rate_limit_headers<B>(mut response: Response<B>, result: &RateLimitResult) -> Response<B> {
    let headers = response.headers_mut();

    if let Ok(v) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }

    response
}

/// Create a 429 Too Many Requests response
fn rate_limit_exceeded_response(result: &RateLimitResult) -> Response<Body> {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "RATE_LIMITED",
            "message": "Too many requests. Please try again later.",
            "retryAfterSeconds": result.retry_after
        }
    });

    let mut response = Response::builder()
        .status(StatusCode::TOO_MANY_REQUESTS)
        .header(header::CONTENT_TYPE, "application/json")
        .header("retry-after", result.retry_after.to_string())
        .body(Body::from(body.to_string()))
        .unwrap();

    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
    if let Ok(v) = HeaderValue::from_str(&result.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }

    response
}

/// Extension trait for adding rate limiting to axum routers
pub trait RateLimitExt {
    /// Apply rate limiting to this router for a specific endpoint
    fn rate_limit(self, state: RateLimitState, endpoint: RateLimitEndpoint) -> Self;
}

impl<S> RateLimitExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn rate_limit(self, state: RateLimitState, endpoint: RateLimitEndpoint) -> Self {
        self.layer(RateLimitLayer::new(state, endpoint))
    }
}
