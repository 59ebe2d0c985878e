// Request logging and latency histogram around each method chain

use crate::handler::{Handler, HandlerResult, Request};
use async_trait::async_trait;
use prometheus::HistogramVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const JSON_RPC_SUBSYSTEM: &str = "json_rpc";

/// Shared across every decorated method so ids are unique per server
#[derive(Debug, Default)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

pub struct Instrumented<H> {
    inner: H,
    ids: Arc<RequestIds>,
    durations: HistogramVec,
}

impl<H: Handler> Instrumented<H> {
    pub fn new(inner: H, ids: Arc<RequestIds>, durations: HistogramVec) -> Self {
        Self {
            inner,
            ids,
            durations,
        }
    }
}

#[async_trait]
impl<H: Handler> Handler for Instrumented<H> {
    async fn handle(&self, request: Request) -> HandlerResult {
        let req_id = self.ids.next();
        let method = request.method.clone();
        info!(subsys = "jsonrpc", req = req_id, method = %method, "starting JSONRPC request");
        debug!(req = req_id, params = %request.params, "starting JSONRPC request params");

        let started = Instant::now();
        let result = self.inner.handle(request).await;
        let duration = started.elapsed();

        let status = match &result {
            Ok(_) => "ok",
            Err(err) => err.category(),
        };
        self.durations
            .with_label_values(&[method.as_str(), status])
            .observe(duration.as_secs_f64());

        info!(
            subsys = "jsonrpc",
            req = req_id,
            method = %method,
            duration = ?duration,
            status,
            "finished JSONRPC request"
        );
        if let Ok(value) = &result {
            debug!(req = req_id, result = %value, "finished JSONRPC request result");
        }
        result
    }
}
