//! Per-client token-bucket rate limiting as a tower layer.
//!
//! Unlike a flat per-request charge, the cost of a request grows with the
//! sentence it submits: matching work is proportional to sentence length,
//! so long sentences drain the bucket faster than short ones.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::warn;

const LOG_INTERVAL: Duration = Duration::from_secs(60);

/// One extra token per this many bytes of submitted sentence.
const COST_CHUNK: usize = 256;

#[derive(Clone)]
pub struct RateLimiterLayer {
    rate_per_sec: f64,
    burst: f64,
}

impl RateLimiterLayer {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            rate_per_sec: rate_per_sec as f64,
            burst: burst as f64,
        }
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            buckets: Arc::new(DashMap::new()),
            dropped_since_log: Arc::new(AtomicU64::new(0)),
            last_log: Arc::new(std::sync::Mutex::new(Instant::now())),
            rate_per_sec: self.rate_per_sec,
            burst: self.burst,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    buckets: Arc<DashMap<String, Bucket>>,
    dropped_since_log: Arc<AtomicU64>,
    last_log: Arc<std::sync::Mutex<Instant>>,
    rate_per_sec: f64,
    burst: f64,
}

#[derive(Clone, Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl<S, ReqBody> Service<axum::http::Request<ReqBody>> for RateLimiter<S>
where
    S: Service<axum::http::Request<ReqBody>, Response = axum::http::Response<axum::body::Body>>
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: axum::http::Request<ReqBody>) -> Self::Future {
        if let Some(client) = client_id(&req) {
            if !self.check_and_consume(&client, request_cost(&req)) {
                self.dropped_since_log.fetch_add(1, Ordering::Relaxed);
                self.log_drops_if_needed();
                return Box::pin(async move {
                    Ok(axum::http::Response::builder()
                        .status(axum::http::StatusCode::TOO_MANY_REQUESTS)
                        .body(axum::body::Body::from("rate limited"))
                        .unwrap())
                });
            }
        }

        let fut = self.inner.call(req);
        Box::pin(async move { fut.await })
    }
}

/// Trust the proxy headers when present; a direct connection carries
/// neither and is never limited.
fn client_id<B>(req: &axum::http::Request<B>) -> Option<String> {
    let headers = req.headers();
    headers
        .get("Fly-Client-IP")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("X-Forwarded-For")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
        })
        .map(|s| s.trim().to_string())
}

/// Tokens a request costs: one, plus one per [`COST_CHUNK`] bytes of the
/// (still percent-encoded) `sentence` query parameter.
fn request_cost<B>(req: &axum::http::Request<B>) -> f64 {
    let sentence_bytes = req
        .uri()
        .query()
        .and_then(sentence_param_len)
        .unwrap_or(0);
    1.0 + (sentence_bytes / COST_CHUNK) as f64
}

fn sentence_param_len(query: &str) -> Option<usize> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("sentence="))
        .map(str::len)
}

impl<S> RateLimiter<S> {
    fn check_and_consume(&self, client: &str, cost: f64) -> bool {
        let mut entry = self.buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: self.burst,
            last_refill: Instant::now(),
        });
        let now = Instant::now();
        let elapsed = now
            .saturating_duration_since(entry.last_refill)
            .as_secs_f64();
        if elapsed > 0.0 {
            entry.tokens = (entry.tokens + elapsed * self.rate_per_sec).min(self.burst);
            entry.last_refill = now;
        }
        if entry.tokens >= cost {
            entry.tokens -= cost;
            true
        } else {
            false
        }
    }

    fn log_drops_if_needed(&self) {
        let now = Instant::now();
        let mut last = self.last_log.lock().unwrap();
        if now.saturating_duration_since(*last) >= LOG_INTERVAL {
            let dropped = self.dropped_since_log.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                warn!("rate limiter dropped {dropped} requests in the last minute");
            }
            *last = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> axum::http::Request<()> {
        axum::http::Request::builder().uri(uri).body(()).unwrap()
    }

    fn limiter(burst: u32) -> RateLimiter<()> {
        RateLimiterLayer::new(0, burst).layer(())
    }

    #[test]
    fn cost_grows_with_sentence_length() {
        assert_eq!(request_cost(&request("/healthz")), 1.0);
        assert_eq!(request_cost(&request("/v1/idioms?sentence=hi")), 1.0);

        let long = "x".repeat(COST_CHUNK * 3);
        let uri = format!("/v1/idioms?sentence={long}&limit=5");
        assert_eq!(request_cost(&request(&uri)), 4.0);
    }

    #[test]
    fn long_sentences_drain_the_bucket_faster() {
        // Zero refill rate, burst of 4: one long sentence spends what four
        // short ones would.
        let limiter = limiter(4);
        let long_cost = request_cost(&request(&format!(
            "/v1/idioms?sentence={}",
            "x".repeat(COST_CHUNK * 3)
        )));
        assert!(limiter.check_and_consume("10.0.0.1", long_cost));
        assert!(!limiter.check_and_consume("10.0.0.1", 1.0));

        let limiter = self::limiter(4);
        for _ in 0..4 {
            assert!(limiter.check_and_consume("10.0.0.2", 1.0));
        }
        assert!(!limiter.check_and_consume("10.0.0.2", 1.0));
    }
}
