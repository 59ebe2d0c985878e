// getHealth: store is populated and the newest ledger is recent enough

use super::{latest_ledger, ledger_range};
use crate::error::RpcError;
use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::GetHealthResponse;
use async_trait::async_trait;
use ledger_rpc_core::port::{LedgerReader, TimeProvider};
use ledger_rpc_core::AppError;
use std::sync::Arc;
use std::time::Duration;

pub struct GetHealth {
    ledger_reader: Arc<dyn LedgerReader>,
    clock: Arc<dyn TimeProvider>,
    retention_window: u32,
    max_healthy_ledger_latency: Duration,
}

impl GetHealth {
    pub fn new(
        ledger_reader: Arc<dyn LedgerReader>,
        clock: Arc<dyn TimeProvider>,
        retention_window: u32,
        max_healthy_ledger_latency: Duration,
    ) -> Self {
        Self {
            ledger_reader,
            clock,
            retention_window,
            max_healthy_ledger_latency,
        }
    }
}

#[async_trait]
impl Handler for GetHealth {
    async fn handle(&self, _request: Request) -> HandlerResult {
        let range = ledger_range(self.ledger_reader.as_ref()).await?;
        let latest = latest_ledger(self.ledger_reader.as_ref()).await?;

        let latency_secs = self.clock.now_secs().saturating_sub(latest.close_time).max(0) as u64;
        let max_secs = self.max_healthy_ledger_latency.as_secs();
        if latency_secs > max_secs {
            return Err(RpcError::App(AppError::Internal(format!(
                "latency ({latency_secs}s) since last known ledger closed is too high (>{max_secs}s)"
            ))));
        }

        to_result(GetHealthResponse {
            status: "healthy".to_string(),
            latest_ledger: range.last,
            oldest_ledger: range.first,
            ledger_retention_window: self.retention_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::testing::{MemoryLedgers, CLOSE_TIME_BASE};
    use ledger_rpc_core::port::time_provider::FixedTimeProvider;
    use serde_json::{json, Value};

    fn health(ledgers: MemoryLedgers, now_secs: i64) -> GetHealth {
        GetHealth::new(
            Arc::new(ledgers),
            Arc::new(FixedTimeProvider(now_secs * 1000)),
            120_960,
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_healthy() {
        // ledger 10 closed at base + 50
        let handler = health(MemoryLedgers::range(1, 10), CLOSE_TIME_BASE + 60);
        let result = handler
            .handle(Request::new("getHealth", Value::Null))
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({
                "status": "healthy",
                "latestLedger": 10,
                "oldestLedger": 1,
                "ledgerRetentionWindow": 120_960,
            })
        );
    }

    #[tokio::test]
    async fn test_stale_ledger_is_unhealthy() {
        let handler = health(MemoryLedgers::range(1, 10), CLOSE_TIME_BASE + 50 + 31);
        let err = handler
            .handle(Request::new("getHealth", Value::Null))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too high"));
    }

    #[tokio::test]
    async fn test_empty_store_is_unhealthy() {
        let handler = health(MemoryLedgers::default(), CLOSE_TIME_BASE);
        let err = handler
            .handle(Request::new("getHealth", Value::Null))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }
}
