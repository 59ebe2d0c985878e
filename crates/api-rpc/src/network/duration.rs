//! Request Duration Limiter
//!
//! Races a request against a warning threshold and a hard limit. Crossing the
//! warning threshold only records a breach. Crossing the hard limit answers
//! the caller with [`RpcError::DurationExceeded`] right away while the request
//! itself keeps running on its own task until it finishes; its late result is
//! dropped.

use crate::error::RpcError;
use crate::handler::{Handler, HandlerResult, Request};
use async_trait::async_trait;
use ledger_rpc_core::AppError;
use prometheus::IntCounter;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

pub struct RequestDurationLimiter<H> {
    inner: Arc<H>,
    resource: String,
    warning_threshold: Duration,
    limit_threshold: Duration,
    warning_counter: Option<IntCounter>,
    limit_counter: Option<IntCounter>,
}

impl<H: Handler> RequestDurationLimiter<H> {
    /// A zero `limit_threshold` disables the hard limit
    pub fn new(
        inner: H,
        resource: impl Into<String>,
        warning_threshold: Duration,
        limit_threshold: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(inner),
            resource: resource.into(),
            warning_threshold,
            limit_threshold,
            warning_counter: None,
            limit_counter: None,
        }
    }

    pub fn with_counters(mut self, warning: IntCounter, limit: IntCounter) -> Self {
        self.warning_counter = Some(warning);
        self.limit_counter = Some(limit);
        self
    }

    fn limit_enabled(&self) -> bool {
        !self.limit_threshold.is_zero()
    }

    /// The warning only makes sense when it fires before the hard limit
    fn warning_enabled(&self) -> bool {
        !self.warning_threshold.is_zero()
            && (!self.limit_enabled() || self.warning_threshold < self.limit_threshold)
    }

    fn joined(&self, method: &str, joined: Result<HandlerResult, JoinError>) -> HandlerResult {
        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                let message = panic_message(err.into_panic());
                error!(
                    resource = %self.resource,
                    method = %method,
                    panic = %message,
                    "Request handler panicked"
                );
                Err(RpcError::Panicked {
                    resource: self.resource.clone(),
                    message,
                })
            }
            Err(err) => Err(RpcError::App(AppError::Internal(format!(
                "request task for {} was cancelled: {}",
                self.resource, err
            )))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_string()
}

#[async_trait]
impl<H: Handler> Handler for RequestDurationLimiter<H> {
    async fn handle(&self, request: Request) -> HandlerResult {
        let method = request.method.clone();
        let started = Instant::now();
        let inner = Arc::clone(&self.inner);
        let mut task = tokio::spawn(async move { inner.handle(request).await });

        let warning_enabled = self.warning_enabled();
        let limit_enabled = self.limit_enabled();
        let warning = sleep(self.warning_threshold);
        let limit = sleep(self.limit_threshold);
        tokio::pin!(warning, limit);
        let mut warned = false;

        loop {
            tokio::select! {
                joined = &mut task => {
                    if warned {
                        info!(
                            resource = %self.resource,
                            method = %method,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Slow request completed after crossing the warning threshold"
                        );
                    }
                    return self.joined(&method, joined);
                }
                _ = &mut warning, if warning_enabled && !warned => {
                    warned = true;
                    if let Some(counter) = &self.warning_counter {
                        counter.inc();
                    }
                    warn!(
                        resource = %self.resource,
                        method = %method,
                        threshold_ms = self.warning_threshold.as_millis() as u64,
                        "Request processing exceeded warning threshold"
                    );
                }
                _ = &mut limit, if limit_enabled => {
                    if let Some(counter) = &self.limit_counter {
                        counter.inc();
                    }
                    info!(
                        resource = %self.resource,
                        method = %method,
                        threshold_ms = self.limit_threshold.as_millis() as u64,
                        "Request processing exceeded limit threshold"
                    );
                    // Dropping the handle detaches the task; it is not aborted
                    return Err(RpcError::DurationExceeded {
                        resource: self.resource.clone(),
                        limit: self.limit_threshold,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    const WARN: Duration = Duration::from_millis(30);
    const HARD: Duration = Duration::from_millis(90);

    fn counters() -> (IntCounter, IntCounter) {
        (
            IntCounter::new("warning", "warning breaches").unwrap(),
            IntCounter::new("limit", "limit breaches").unwrap(),
        )
    }

    fn sleeping(millis: u64, finished: Arc<AtomicBool>) -> impl Handler {
        handler_fn(move |_| {
            let finished = Arc::clone(&finished);
            async move {
                sleep(Duration::from_millis(millis)).await;
                finished.store(true, Ordering::SeqCst);
                Ok(json!(millis))
            }
        })
    }

    fn limiter(
        millis: u64,
        warn: Duration,
        hard: Duration,
    ) -> (RequestDurationLimiter<impl Handler>, IntCounter, IntCounter, Arc<AtomicBool>) {
        let finished = Arc::new(AtomicBool::new(false));
        let (warning, limit) = counters();
        let limiter = RequestDurationLimiter::new(
            sleeping(millis, Arc::clone(&finished)),
            "getLedgers",
            warn,
            hard,
        )
        .with_counters(warning.clone(), limit.clone());
        (limiter, warning, limit, finished)
    }

    fn request() -> Request {
        Request::new("getLedgers", Value::Null)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_touches_no_counter() {
        let (limiter, warning, limit, _) = limiter(10, WARN, HARD);
        assert_eq!(limiter.handle(request()).await.unwrap(), json!(10));
        assert_eq!(warning.get(), 0);
        assert_eq!(limit.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_only_warns() {
        let (limiter, warning, limit, _) = limiter(50, WARN, HARD);
        assert_eq!(limiter.handle(request()).await.unwrap(), json!(50));
        assert_eq!(warning.get(), 1);
        assert_eq!(limit.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_limit_returns_early_without_aborting() {
        let (limiter, warning, limit, finished) = limiter(200, WARN, HARD);

        let started = Instant::now();
        let err = limiter.handle(request()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, RpcError::DurationExceeded { limit: exceeded, .. } if exceeded == HARD));
        assert!(elapsed >= HARD && elapsed < Duration::from_millis(200));
        assert_eq!(warning.get(), 1);
        assert_eq!(limit.get(), 1);
        assert!(!finished.load(Ordering::SeqCst));

        // The detached handler still runs to completion
        sleep(Duration::from_millis(150)).await;
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(warning.get(), 1);
        assert_eq!(limit.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_hard_limit_never_aborts() {
        let (limiter, warning, limit, _) = limiter(500, WARN, Duration::ZERO);
        assert_eq!(limiter.handle(request()).await.unwrap(), json!(500));
        assert_eq!(warning.get(), 1);
        assert_eq!(limit.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warning_at_or_above_limit_is_disabled() {
        let (limiter, warning, limit, _) = limiter(200, HARD, HARD);
        assert!(limiter.handle(request()).await.is_err());
        assert_eq!(warning.get(), 0);
        assert_eq!(limit.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_errors_pass_through() {
        let limiter = RequestDurationLimiter::new(
            handler_fn(|_| async { Err(RpcError::InvalidParams("startLedger".to_string())) }),
            "getLedgers",
            WARN,
            HARD,
        );
        assert!(matches!(
            limiter.handle(request()).await,
            Err(RpcError::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        async fn explode(_: Request) -> HandlerResult {
            panic!("ledger store vanished")
        }

        let limiter = RequestDurationLimiter::new(handler_fn(explode), "getLedgers", WARN, HARD);
        let err = limiter.handle(request()).await.unwrap_err();
        let RpcError::Panicked { resource, message } = &err else {
            panic!("expected panic error, got {err:?}");
        };
        assert_eq!(resource, "getLedgers");
        assert_eq!(message, "ledger store vanished");
        assert_eq!(err.code(), crate::error::code::INTERNAL_ERROR);
    }
}
