//! Backlog Queue Limiter
//!
//! Fail-fast admission gate bounding the number of concurrently in-flight
//! requests for one resource (a single method, or the whole server). Despite
//! the name nothing waits in a queue: once `limit` requests are in flight,
//! new ones are rejected immediately.

use crate::error::RpcError;
use crate::handler::{Handler, HandlerResult, Request};
use async_trait::async_trait;
use prometheus::{IntCounter, IntGauge};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub struct BacklogQueueLimiter<H> {
    inner: H,
    resource: String,
    limit: u64,
    pending: AtomicU64,
    gauge: Option<IntGauge>,
    rejections: Option<IntCounter>,
}

/// Releases one admitted slot when dropped, whatever way the request ends
struct InflightGuard<'a> {
    pending: &'a AtomicU64,
    gauge: Option<&'a IntGauge>,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        if let Some(gauge) = self.gauge {
            gauge.dec();
        }
    }
}

impl<H: Handler> BacklogQueueLimiter<H> {
    pub fn new(inner: H, resource: impl Into<String>, limit: u64) -> Self {
        Self {
            inner,
            resource: resource.into(),
            limit,
            pending: AtomicU64::new(0),
            gauge: None,
            rejections: None,
        }
    }

    /// In-flight gauge, kept equal to the pending count
    pub fn with_gauge(mut self, gauge: IntGauge) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Incremented once per rejected request
    pub fn with_rejection_counter(mut self, counter: IntCounter) -> Self {
        self.rejections = Some(counter);
        self
    }

    pub fn in_flight(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Check-and-increment as one atomic step
    fn try_admit(&self) -> Option<InflightGuard<'_>> {
        let mut current = self.pending.load(Ordering::Acquire);
        loop {
            if current >= self.limit {
                return None;
            }
            match self.pending.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        if let Some(gauge) = &self.gauge {
            gauge.inc();
        }
        Some(InflightGuard {
            pending: &self.pending,
            gauge: self.gauge.as_ref(),
        })
    }
}

#[async_trait]
impl<H: Handler> Handler for BacklogQueueLimiter<H> {
    async fn handle(&self, request: Request) -> HandlerResult {
        let Some(_guard) = self.try_admit() else {
            if let Some(counter) = &self.rejections {
                counter.inc();
            }
            info!(
                resource = %self.resource,
                limit = self.limit,
                method = %request.method,
                "Queue limiter reached the queue limit of concurrent requests"
            );
            return Err(RpcError::BacklogFull {
                resource: self.resource.clone(),
                limit: self.limit,
            });
        };
        self.inner.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::{Barrier, Notify};

    fn request() -> Request {
        Request::new("getHealth", Value::Null)
    }

    async fn explode(_: Request) -> HandlerResult {
        panic!("handler blew up")
    }

    #[tokio::test]
    async fn test_admits_below_limit() {
        let limiter = BacklogQueueLimiter::new(
            handler_fn(|_| async { Ok(json!("ok")) }),
            "getHealth",
            2,
        );
        assert_eq!(limiter.handle(request()).await.unwrap(), json!("ok"));
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_zero_limit_rejects_everything() {
        let limiter =
            BacklogQueueLimiter::new(handler_fn(|_| async { Ok(Value::Null) }), "getHealth", 0);
        let err = limiter.handle(request()).await.unwrap_err();
        assert!(matches!(err, RpcError::BacklogFull { limit: 0, .. }));
    }

    #[tokio::test]
    async fn test_error_paths_release_slot() {
        let gauge = IntGauge::new("inflight", "in-flight").unwrap();
        let limiter = BacklogQueueLimiter::new(
            handler_fn(|_| async { Err(RpcError::InvalidParams("bad".to_string())) }),
            "getHealth",
            1,
        )
        .with_gauge(gauge.clone());

        for _ in 0..3 {
            assert!(matches!(
                limiter.handle(request()).await,
                Err(RpcError::InvalidParams(_))
            ));
        }
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(gauge.get(), 0);
    }

    #[tokio::test]
    async fn test_panic_releases_slot() {
        let limiter = Arc::new(BacklogQueueLimiter::new(
            handler_fn(explode),
            "getHealth",
            1,
        ));

        let task = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.handle(request()).await })
        };
        assert!(task.await.unwrap_err().is_panic());
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_releases_slot() {
        let release = Arc::new(Notify::new());
        let limiter = {
            let release = Arc::clone(&release);
            BacklogQueueLimiter::new(
                handler_fn(move |_| {
                    let release = Arc::clone(&release);
                    async move {
                        release.notified().await;
                        Ok(Value::Null)
                    }
                }),
                "getHealth",
                1,
            )
        };

        let pending = limiter.handle(request());
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_never_exceeds_limit() {
        const LIMIT: u64 = 4;
        const REQUESTS: usize = 32;

        let release = Arc::new(Notify::new());
        let entered = Arc::new(Barrier::new(LIMIT as usize + 1));
        let gauge = IntGauge::new("inflight", "in-flight").unwrap();
        let rejections = IntCounter::new("rejections", "rejected").unwrap();

        let limiter = {
            let release = Arc::clone(&release);
            let entered = Arc::clone(&entered);
            Arc::new(
                BacklogQueueLimiter::new(
                    handler_fn(move |_| {
                        let release = Arc::clone(&release);
                        let entered = Arc::clone(&entered);
                        async move {
                            let released = release.notified();
                            entered.wait().await;
                            released.await;
                            Ok(json!("done"))
                        }
                    }),
                    "getEvents",
                    LIMIT,
                )
                .with_gauge(gauge.clone())
                .with_rejection_counter(rejections.clone()),
            )
        };

        let mut tasks = Vec::new();
        for _ in 0..REQUESTS {
            let limiter = Arc::clone(&limiter);
            tasks.push(tokio::spawn(async move { limiter.handle(request()).await }));
        }

        // Every admitted request is parked inside the handler
        entered.wait().await;
        assert_eq!(limiter.in_flight(), LIMIT);
        assert_eq!(gauge.get(), LIMIT as i64);

        // Rejections are immediate, so wait for them before releasing
        while rejections.get() < (REQUESTS as u64 - LIMIT) {
            tokio::task::yield_now().await;
        }
        assert_eq!(limiter.in_flight(), LIMIT);
        release.notify_waiters();

        let mut admitted = 0;
        let mut rejected = 0;
        for outcome in futures::future::join_all(tasks).await {
            match outcome.unwrap() {
                Ok(_) => admitted += 1,
                Err(RpcError::BacklogFull { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(admitted, LIMIT as usize);
        assert_eq!(rejected, REQUESTS - LIMIT as usize);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(gauge.get(), 0);
    }
}
