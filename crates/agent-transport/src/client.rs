//! Outbound A2A Transport: timeout, retry with jittered backoff, and a
//! per-destination circuit breaker wrap every call to `{endpoint}/a2a/messages`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::circuit::CircuitBreaker;
use crate::errors::{RateLimitedDetail, Result, TransportError};
use crate::types::A2aMessage;

/// Tunables for outbound calls, mirroring §4.6's defaults.
#[derive(Debug, Clone)]
pub struct A2aClientConfig {
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub circuit_failure_threshold: u32,
    pub circuit_cooldown: Duration,
    /// In-flight call cap per destination, enforced with a [`Semaphore`].
    pub max_in_flight_per_destination: usize,
    /// Bounded queue of callers waiting for an in-flight slot; exceeding
    /// this rejects immediately with [`TransportError::Overloaded`].
    pub max_queued_per_destination: usize,
}

impl Default for A2aClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            circuit_failure_threshold: 5,
            circuit_cooldown: Duration::from_secs(30),
            max_in_flight_per_destination: 64,
            max_queued_per_destination: 256,
        }
    }
}

/// Per-destination backpressure: a bounded "waiting room" (`queue`) gates
/// entry onto the in-flight semaphore, so a destination already past its
/// queue capacity rejects immediately instead of piling up callers.
struct Limiter {
    in_flight: Arc<Semaphore>,
    queue: Arc<Semaphore>,
}

impl Limiter {
    fn new(max_in_flight: usize, max_queued: usize) -> Self {
        Self { in_flight: Arc::new(Semaphore::new(max_in_flight)), queue: Arc::new(Semaphore::new(max_queued)) }
    }
}

/// Sends A2A messages to remote agents, applying backpressure, retry,
/// backoff, and circuit-breaking per destination endpoint.
pub struct A2aClient {
    http: reqwest::Client,
    config: A2aClientConfig,
    breakers: AsyncMutex<HashMap<String, Arc<CircuitBreaker>>>,
    limiters: AsyncMutex<HashMap<String, Arc<Limiter>>>,
}

impl A2aClient {
    pub fn new(config: A2aClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            breakers: AsyncMutex::new(HashMap::new()),
            limiters: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn breaker_for(&self, endpoint: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(self.config.circuit_failure_threshold, self.config.circuit_cooldown))
            })
            .clone()
    }

    async fn limiter_for(&self, endpoint: &str) -> Arc<Limiter> {
        let mut limiters = self.limiters.lock().await;
        limiters
            .entry(endpoint.to_string())
            .or_insert_with(|| {
                Arc::new(Limiter::new(self.config.max_in_flight_per_destination, self.config.max_queued_per_destination))
            })
            .clone()
    }

    /// Acquire a queue slot (rejecting immediately with `Overloaded` if the
    /// bounded waiting room is full), then wait for an in-flight permit.
    /// The returned guards must be held for the duration of the call.
    async fn admit(&self, endpoint: &str) -> Result<tokio::sync::OwnedSemaphorePermit> {
        let limiter = self.limiter_for(endpoint).await;
        let queue_permit = limiter
            .queue
            .clone()
            .try_acquire_owned()
            .map_err(|_| TransportError::Overloaded(endpoint.to_string()))?;
        let in_flight_permit =
            limiter.in_flight.clone().acquire_owned().await.expect("semaphore is never closed");
        drop(queue_permit);
        Ok(in_flight_permit)
    }

    /// Send a `Request` message and await the correlated response body.
    /// Applies the full backpressure/timeout/retry/circuit-breaker policy.
    pub async fn send_request(&self, endpoint: &str, message: &A2aMessage) -> Result<A2aMessage> {
        let _in_flight = self.admit(endpoint).await?;

        let breaker = self.breaker_for(endpoint).await;
        if !breaker.allow() {
            return Err(TransportError::CircuitOpen(endpoint.to_string()));
        }

        let timeout = message
            .time_to_live_seconds
            .map(Duration::from_secs)
            .map(|ttl| ttl.min(self.config.default_timeout))
            .unwrap_or(self.config.default_timeout);

        let mut attempt = 0;
        loop {
            let result = self.try_once(endpoint, message, timeout).await;
            match result {
                Ok(response) => {
                    breaker.record_success();
                    return Ok(response);
                }
                Err(e) if attempt < self.config.max_retries && e.retryable() => {
                    attempt += 1;
                    let delay = e.retry_after().unwrap_or_else(|| self.backoff(attempt));
                    tracing::warn!(endpoint = %endpoint, attempt, error = %e, delay = ?delay, "retrying a2a call");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    breaker.record_failure();
                    return Err(e);
                }
            }
        }
    }

    /// Fire a `Send`/notification message; does not await a correlated
    /// response, only that the destination accepted it.
    pub async fn send_notification(&self, endpoint: &str, message: &A2aMessage) -> Result<()> {
        let _in_flight = self.admit(endpoint).await?;

        let breaker = self.breaker_for(endpoint).await;
        if !breaker.allow() {
            return Err(TransportError::CircuitOpen(endpoint.to_string()));
        }
        match self.post(endpoint, message, self.config.default_timeout).await {
            Ok(_) => {
                breaker.record_success();
                Ok(())
            }
            Err(e) => {
                breaker.record_failure();
                Err(e)
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_delay.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_secs_f64((base * jitter).max(0.0))
    }

    async fn try_once(&self, endpoint: &str, message: &A2aMessage, timeout: Duration) -> Result<A2aMessage> {
        let response = self.post(endpoint, message, timeout).await?;
        response
            .json::<A2aMessage>()
            .await
            .map_err(|e| TransportError::ProtocolError(endpoint.to_string(), e.to_string()))
    }

    async fn post(&self, endpoint: &str, message: &A2aMessage, timeout: Duration) -> Result<reqwest::Response> {
        let url = format!("{}/a2a/messages", endpoint.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(message)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(endpoint.to_string())
                } else {
                    TransportError::Unreachable(endpoint.to_string(), e.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() || status == StatusCode::ACCEPTED => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(TransportError::Unauthorized(endpoint.to_string()))
            }
            status @ (StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS) => {
                let retry_after = retry_after_duration(&response);
                tracing::debug!(endpoint = %endpoint, %status, retry_after = ?retry_after, "destination requested a retry delay");
                Err(TransportError::RateLimited(endpoint.to_string(), RateLimitedDetail(retry_after)))
            }
            status if status.is_server_error() => {
                Err(TransportError::Unreachable(endpoint.to_string(), format!("http {status}")))
            }
            status => Err(TransportError::ProtocolError(endpoint.to_string(), format!("http {status}"))),
        }
    }
}

/// Parse a `Retry-After` header's seconds form (`Retry-After: 120`). The
/// HTTP-date form is not honored; callers fall back to jittered backoff.
fn retry_after_duration(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
