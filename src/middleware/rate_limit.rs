// src/middleware/rate_limit.rs

use std::{
    collections::HashMap,
    net::SocketAddr,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

#[derive(Debug, Clone, Copy)]
enum Limit {
    /// `RATE_LIMIT_PER_MINUTE`
    Configured,
    PerMinute(u32),
}

// Rotas sensíveis e seu limite por IP.
const LIMITED_ROUTES: &[(&str, &str, Limit)] = &[
    ("POST", "/api/v1/auth/signup", Limit::Configured),
    ("POST", "/api/v1/auth/signin", Limit::Configured),
    ("POST", "/api/v1/auth/google-signin", Limit::Configured),
    ("POST", "/api/v1/auth/refresh", Limit::Configured),
    ("POST", "/api/v1/auth/verify", Limit::Configured),
    ("POST", "/api/v1/auth/verify-otp", Limit::Configured),
    ("POST", "/api/v1/auth/resend-verification", Limit::Configured),
    ("POST", "/api/v1/auth/forgot-password", Limit::Configured),
    ("POST", "/api/v1/auth/reset-password-otp", Limit::Configured),
    ("POST", "/api/v1/onboarding", Limit::PerMinute(5)),
    ("GET", "/api/v1/onboarding/file/signed-url", Limit::PerMinute(15)),
    ("GET", "/api/v1/onboarding/categories", Limit::PerMinute(30)),
    ("POST", "/api/v1/onboarding/categories", Limit::PerMinute(10)),
];

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

// Acima disso, baldes parados são descartados antes de criar um novo.
const MAX_TRACKED_KEYS: usize = 10_000;
// Um balde parado por um minuto já está cheio de novo; descartá-lo não muda nada.
const MAX_IDLE: Duration = Duration::from_secs(60);

/// Token bucket em memória, uma chave por `ip + rota`.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    max_keys: usize,
    max_idle: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_limits(MAX_TRACKED_KEYS, MAX_IDLE)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_keys: usize, max_idle: Duration) -> Self {
        Self { buckets: Mutex::new(HashMap::new()), max_keys, max_idle }
    }

    pub async fn allow(&self, key: &str, per_minute: u32) -> bool {
        let capacity = f64::from(per_minute.max(1));
        let refill_per_sec = capacity / 60.0;

        let now = Instant::now();
        let mut lock = self.buckets.lock().await;
        if lock.len() >= self.max_keys && !lock.contains_key(key) {
            evict_idle(&mut lock, now, self.max_idle);
            tracing::debug!("Rate limiter: {} chaves após limpeza", lock.len());
        }

        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * refill_per_sec).min(capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

/// Remove baldes sem uso há pelo menos `max_idle`.
fn evict_idle(buckets: &mut HashMap<String, Bucket>, now: Instant, max_idle: Duration) {
    buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < max_idle);
}

fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Aplicado no router raiz; só age nas rotas de `LIMITED_ROUTES`.
pub async fn rate_limit_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().trim_end_matches('/');
    let limit = LIMITED_ROUTES
        .iter()
        .find(|(method, route, _)| *method == request.method().as_str() && *route == path)
        .map(|(_, _, limit)| *limit);

    if let Some(limit) = limit {
        let per_minute = match limit {
            Limit::Configured => app_state.settings.rate_limit_per_minute,
            Limit::PerMinute(n) => n,
        };
        let key = format!("{}:{} {}", client_ip(&request), request.method(), path);
        if !app_state.rate_limiter.allow(&key, per_minute).await {
            tracing::warn!("Limite de requisições excedido para {}", key);
            return Err(AppError::RateLimited.to_api_error(&locale, &app_state.i18n_store));
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_empties_after_capacity() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.allow("1.2.3.4:POST /x", 3).await);
        }
        assert!(!limiter.allow("1.2.3.4:POST /x", 3).await);
        // Outra chave tem seu próprio balde
        assert!(limiter.allow("5.6.7.8:POST /x", 3).await);
    }

    #[tokio::test]
    async fn idle_buckets_are_evicted_once_the_map_is_full() {
        // Com max_idle zero, todo balde existente conta como parado.
        let limiter = RateLimiter::with_limits(100, Duration::ZERO);
        for i in 0..1_000 {
            assert!(limiter.allow(&format!("10.0.{}.{}:POST /x", i / 256, i % 256), 5).await);
        }
        assert!(limiter.tracked_keys().await <= 100);
    }

    #[tokio::test]
    async fn active_buckets_survive_cleanup() {
        let limiter = RateLimiter::with_limits(2, Duration::from_secs(3600));
        assert!(limiter.allow("a:POST /x", 1).await);
        assert!(limiter.allow("b:POST /x", 1).await);
        // Mapa cheio, mas nada parado: o balde de "a" continua vazio.
        assert!(limiter.allow("c:POST /x", 1).await);
        assert!(!limiter.allow("a:POST /x", 1).await);
        assert_eq!(limiter.tracked_keys().await, 3);
    }
}
