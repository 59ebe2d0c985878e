//! RPC Request/Response Types
//!
//! Wire shapes of the JSON-RPC methods. Field names are camelCase; large
//! integers in fee statistics travel as decimal strings.

use ledger_rpc_core::domain::LedgerCloseMeta;
use ledger_rpc_core::feewindow::FeeDistribution;
use serde::{Deserialize, Serialize};

/// getHealth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResponse {
    pub status: String,
    pub latest_ledger: u32,
    pub oldest_ledger: u32,
    pub ledger_retention_window: u32,
}

/// getNetwork
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNetworkResponse {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub friendbot_url: Option<String>,
    pub passphrase: String,
    pub protocol_version: u32,
}

/// getVersionInfo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVersionInfoResponse {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub build_timestamp: Option<String>,
    pub protocol_version: u32,
}

/// getLatestLedger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestLedgerResponse {
    /// Hash of the latest ledger
    pub id: String,
    pub sequence: u32,
    pub protocol_version: u32,
}

/// getLedgers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgersRequest {
    #[serde(default)]
    pub start_ledger: u32,
    #[serde(default)]
    pub pagination: Option<LedgerPagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPagination {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub hash: String,
    pub sequence: u32,
    pub ledger_close_time: String,
    pub metadata_json: LedgerCloseMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgersResponse {
    pub ledgers: Vec<LedgerEntry>,
    pub latest_ledger: u32,
    pub latest_ledger_close_time: i64,
    pub oldest_ledger: u32,
    pub oldest_ledger_close_time: i64,
    pub cursor: String,
}

/// Fee statistics as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeDistributionResponse {
    pub max: String,
    pub min: String,
    pub mode: String,
    pub p10: String,
    pub p20: String,
    pub p30: String,
    pub p40: String,
    pub p50: String,
    pub p60: String,
    pub p70: String,
    pub p80: String,
    pub p90: String,
    pub p95: String,
    pub p99: String,
    pub transaction_count: String,
    pub ledger_count: u32,
}

impl From<FeeDistribution> for FeeDistributionResponse {
    fn from(d: FeeDistribution) -> Self {
        Self {
            max: d.max.to_string(),
            min: d.min.to_string(),
            mode: d.mode.to_string(),
            p10: d.p10.to_string(),
            p20: d.p20.to_string(),
            p30: d.p30.to_string(),
            p40: d.p40.to_string(),
            p50: d.p50.to_string(),
            p60: d.p60.to_string(),
            p70: d.p70.to_string(),
            p80: d.p80.to_string(),
            p90: d.p90.to_string(),
            p95: d.p95.to_string(),
            p99: d.p99.to_string(),
            transaction_count: d.fee_count.to_string(),
            ledger_count: d.ledger_count,
        }
    }
}

/// getFeeStats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFeeStatsResponse {
    pub soroban_inclusion_fee: FeeDistributionResponse,
    pub inclusion_fee: FeeDistributionResponse,
    pub latest_ledger: u32,
}
