//! JSON-RPC method handlers
//!
//! Each method is a plain [`Handler`](crate::handler::Handler); limits and
//! instrumentation are layered on by [`crate::compose`].

pub mod fee_stats;
pub mod health;
pub mod latest_ledger;
pub mod ledgers;
pub mod network_info;
pub mod version_info;

pub use fee_stats::GetFeeStats;
pub use health::GetHealth;
pub use latest_ledger::GetLatestLedger;
pub use ledgers::GetLedgers;
pub use network_info::GetNetwork;
pub use version_info::GetVersionInfo;

use crate::error::RpcError;
use ledger_rpc_core::port::{LedgerInfo, LedgerReader, LedgerSeqRange};
use ledger_rpc_core::AppError;

pub const GET_HEALTH: &str = "getHealth";
pub const GET_NETWORK: &str = "getNetwork";
pub const GET_VERSION_INFO: &str = "getVersionInfo";
pub const GET_LATEST_LEDGER: &str = "getLatestLedger";
pub const GET_LEDGERS: &str = "getLedgers";
pub const GET_FEE_STATS: &str = "getFeeStats";

fn not_initialized() -> RpcError {
    RpcError::App(AppError::InvalidState(
        "data stores are not initialized".to_string(),
    ))
}

pub(crate) async fn ledger_range(reader: &dyn LedgerReader) -> Result<LedgerSeqRange, RpcError> {
    reader.get_ledger_range().await?.ok_or_else(not_initialized)
}

pub(crate) async fn latest_ledger(reader: &dyn LedgerReader) -> Result<LedgerInfo, RpcError> {
    reader.get_latest_ledger().await?.ok_or_else(not_initialized)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use ledger_rpc_core::domain::LedgerCloseMeta;
    use ledger_rpc_core::port::{LedgerInfo, LedgerReader, LedgerSeqRange};
    use ledger_rpc_core::Result;

    pub const CLOSE_TIME_BASE: i64 = 1_700_000_000;

    /// Ledgers held in memory, ascending and contiguous
    #[derive(Default)]
    pub struct MemoryLedgers(pub Vec<LedgerCloseMeta>);

    impl MemoryLedgers {
        pub fn range(first: u32, last: u32) -> Self {
            Self((first..=last).map(ledger).collect())
        }
    }

    pub fn ledger(seq: u32) -> LedgerCloseMeta {
        LedgerCloseMeta {
            sequence: seq,
            close_time: CLOSE_TIME_BASE + seq as i64 * 5,
            hash: format!("hash-{seq}"),
            protocol_version: 22,
            transactions: vec![],
            tx_processing: vec![],
        }
    }

    #[async_trait]
    impl LedgerReader for MemoryLedgers {
        async fn get_ledger_range(&self) -> Result<Option<LedgerSeqRange>> {
            Ok(match (self.0.first(), self.0.last()) {
                (Some(first), Some(last)) => Some(LedgerSeqRange {
                    first: first.sequence,
                    last: last.sequence,
                }),
                _ => None,
            })
        }

        async fn get_latest_ledger(&self) -> Result<Option<LedgerInfo>> {
            Ok(self.0.last().map(LedgerInfo::from))
        }

        async fn get_ledgers(&self, start: u32, limit: u32) -> Result<Vec<LedgerCloseMeta>> {
            Ok(self
                .0
                .iter()
                .filter(|l| l.sequence >= start)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }
}
