//! Limiter composition
//!
//! Outer to inner: global duration, global backlog, dispatcher, request
//! decorator, method duration, method backlog, method handler. A request the
//! backlog gate rejects never starts the duration clock of the limiter
//! wrapping it.

use crate::error::ServerError;
use crate::handler::Handler;
use crate::metrics::{Metrics, NETWORK_SUBSYSTEM};
use crate::network::{BacklogQueueLimiter, RequestDurationLimiter};
use std::time::Duration;

/// Per-method warning threshold is this fraction of the hard limit
pub const WARNING_THRESHOLD_DENOMINATOR: u32 = 3;

pub const GLOBAL_RESOURCE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodLimits {
    pub queue_limit: u64,
    pub max_execution_duration: Duration,
}

impl MethodLimits {
    pub fn new(queue_limit: u64, max_execution_duration: Duration) -> Self {
        Self {
            queue_limit,
            max_execution_duration,
        }
    }

    pub fn warning_threshold(&self) -> Duration {
        self.max_execution_duration / WARNING_THRESHOLD_DENOMINATOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalLimits {
    pub queue_limit: u64,
    pub warning_threshold: Duration,
    pub max_execution_duration: Duration,
}

impl GlobalLimits {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.queue_limit == 0 {
            return Err(ServerError::InvalidLimits {
                resource: GLOBAL_RESOURCE.to_string(),
                reason: "queue limit must be positive".to_string(),
            });
        }
        if !self.max_execution_duration.is_zero()
            && self.warning_threshold >= self.max_execution_duration
        {
            return Err(ServerError::InvalidLimits {
                resource: GLOBAL_RESOURCE.to_string(),
                reason: format!(
                    "warning threshold {:?} must be below execution limit {:?}",
                    self.warning_threshold, self.max_execution_duration
                ),
            });
        }
        Ok(())
    }
}

/// `getFeeStats` -> `get_fee_stats`, `GetHealth` -> `get_health`
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

pub type Limited<H> = RequestDurationLimiter<BacklogQueueLimiter<H>>;

/// Wraps one method handler in its backlog gate and duration limiter
pub fn compose_method<H: Handler>(
    metrics: &Metrics,
    method: &str,
    handler: H,
    limits: MethodLimits,
) -> Result<Limited<H>, ServerError> {
    let snake = to_snake_case(method);

    let inflight = metrics.int_gauge(
        NETWORK_SUBSYSTEM,
        &format!("{snake}_inflight_requests"),
        &format!("Number of concurrently in-flight {method} requests"),
    )?;
    let rejected = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        &format!("{snake}_rejected_requests"),
        &format!("Number of {method} requests rejected by the queue limit"),
    )?;
    let warning = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        &format!("{snake}_execution_threshold_warning"),
        &format!(
            "The metric measures the count of {method} requests that surpassed the warning threshold for execution time"
        ),
    )?;
    let limit = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        &format!("{snake}_execution_threshold_limit"),
        &format!(
            "The metric measures the count of {method} requests that surpassed the limit threshold for execution time"
        ),
    )?;

    let backlog = BacklogQueueLimiter::new(handler, method, limits.queue_limit)
        .with_gauge(inflight)
        .with_rejection_counter(rejected);
    Ok(RequestDurationLimiter::new(
        backlog,
        method,
        limits.warning_threshold(),
        limits.max_execution_duration,
    )
    .with_counters(warning, limit))
}

/// Wraps the whole dispatcher in the cross-method gate and limiter
pub fn compose_global<H: Handler>(
    metrics: &Metrics,
    inner: H,
    limits: GlobalLimits,
) -> Result<Limited<H>, ServerError> {
    limits.validate()?;

    let inflight = metrics.int_gauge(
        NETWORK_SUBSYSTEM,
        "global_inflight_requests",
        "Number of concurrently in-flight requests",
    )?;
    let rejected = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        "global_rejected_requests",
        "Number of requests rejected by the global queue limit",
    )?;
    let warning = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        "global_request_execution_duration_threshold_warning",
        "The metric measures the count of requests that surpassed the warning threshold for execution time",
    )?;
    let limit = metrics.int_counter(
        NETWORK_SUBSYSTEM,
        "global_request_execution_duration_threshold_limit",
        "The metric measures the count of requests that surpassed the limit threshold for execution time",
    )?;

    let backlog = BacklogQueueLimiter::new(inner, GLOBAL_RESOURCE, limits.queue_limit)
        .with_gauge(inflight)
        .with_rejection_counter(rejected);
    Ok(RequestDurationLimiter::new(
        backlog,
        GLOBAL_RESOURCE,
        limits.warning_threshold,
        limits.max_execution_duration,
    )
    .with_counters(warning, limit))
}
