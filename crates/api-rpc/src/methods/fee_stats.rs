// getFeeStats: current classic and smart-contract inclusion fee distributions

use super::ledger_range;
use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::GetFeeStatsResponse;
use async_trait::async_trait;
use ledger_rpc_core::feewindow::FeeWindows;
use ledger_rpc_core::port::LedgerReader;
use std::sync::Arc;

pub struct GetFeeStats {
    fee_windows: Arc<FeeWindows>,
    ledger_reader: Arc<dyn LedgerReader>,
}

impl GetFeeStats {
    pub fn new(fee_windows: Arc<FeeWindows>, ledger_reader: Arc<dyn LedgerReader>) -> Self {
        Self {
            fee_windows,
            ledger_reader,
        }
    }
}

#[async_trait]
impl Handler for GetFeeStats {
    async fn handle(&self, _request: Request) -> HandlerResult {
        let range = ledger_range(self.ledger_reader.as_ref()).await?;
        to_result(GetFeeStatsResponse {
            soroban_inclusion_fee: self.fee_windows.soroban_inclusion_fee_distribution().into(),
            inclusion_fee: self.fee_windows.classic_fee_distribution().into(),
            latest_ledger: range.last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::testing::MemoryLedgers;
    use ledger_rpc_core::feewindow::LedgerBucket;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_fee_stats_reflect_windows() {
        let windows = Arc::new(FeeWindows::new(10, 50, "Test SDF Network ; September 2015").unwrap());
        windows
            .classic()
            .append_ledger_fees(LedgerBucket {
                ledger_seq: 7,
                ledger_close_timestamp: 1_700_000_035,
                bucket_content: vec![30, 10, 20, 10, 10],
            })
            .unwrap();

        let handler = GetFeeStats::new(windows, Arc::new(MemoryLedgers::range(1, 7)));
        let result = handler
            .handle(Request::new("getFeeStats", Value::Null))
            .await
            .unwrap();

        assert_eq!(result["latestLedger"], json!(7));
        assert_eq!(result["inclusionFee"]["mode"], json!("10"));
        assert_eq!(result["inclusionFee"]["p50"], json!("10"));
        assert_eq!(result["inclusionFee"]["max"], json!("30"));
        assert_eq!(result["inclusionFee"]["transactionCount"], json!("5"));
        assert_eq!(result["inclusionFee"]["ledgerCount"], json!(1));
        assert_eq!(result["sorobanInclusionFee"]["transactionCount"], json!("0"));
    }
}
