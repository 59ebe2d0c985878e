// Ledger Reader Port (Interface)

use crate::domain::LedgerCloseMeta;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Inclusive range of stored ledger sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerSeqRange {
    pub first: u32,
    pub last: u32,
}

impl LedgerSeqRange {
    pub fn len(&self) -> u32 {
        self.last.saturating_sub(self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// The trailing `count` ledgers of this range
    pub fn tail(&self, count: u32) -> LedgerSeqRange {
        let first = self
            .last
            .saturating_sub(count.saturating_sub(1))
            .max(self.first);
        LedgerSeqRange {
            first,
            last: self.last,
        }
    }
}

/// Header-level view of a stored ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerInfo {
    pub sequence: u32,
    pub hash: String,
    pub close_time: i64,
    pub protocol_version: u32,
}

impl From<&LedgerCloseMeta> for LedgerInfo {
    fn from(meta: &LedgerCloseMeta) -> Self {
        Self {
            sequence: meta.sequence,
            hash: meta.hash.clone(),
            close_time: meta.close_time,
            protocol_version: meta.protocol_version,
        }
    }
}

/// Read access to ingested ledgers
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// First and last stored ledger, None on an empty store
    async fn get_ledger_range(&self) -> Result<Option<LedgerSeqRange>>;

    /// Most recently ingested ledger
    async fn get_latest_ledger(&self) -> Result<Option<LedgerInfo>>;

    /// Up to `limit` ledgers starting at `start`, ascending
    async fn get_ledgers(&self, start: u32, limit: u32) -> Result<Vec<LedgerCloseMeta>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_clamps_to_range() {
        let range = LedgerSeqRange { first: 10, last: 20 };
        assert_eq!(range.len(), 11);
        assert_eq!(range.tail(5), LedgerSeqRange { first: 16, last: 20 });
        assert_eq!(range.tail(50), range);
        assert_eq!(range.tail(1), LedgerSeqRange { first: 20, last: 20 });
    }
}
