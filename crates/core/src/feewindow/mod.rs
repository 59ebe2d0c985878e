//! Fee statistics over a sliding window of recent ledgers.
//!
//! [`LedgerBucketWindow`] keeps the last N per-ledger fee buckets,
//! [`FeeWindow`] maintains a cached [`FeeDistribution`] over them and
//! [`FeeWindows`] feeds the classic and smart-contract inclusion fee windows
//! from ledger-close metadata.

mod bucket_window;
mod distribution;
mod window;
mod windows;

pub use bucket_window::{LedgerBucket, LedgerBucketWindow};
pub use distribution::FeeDistribution;
pub use window::FeeWindow;
pub use windows::FeeWindows;

use crate::domain::LedgerMetaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeeWindowError {
    #[error("retention window must be positive")]
    EmptyRetentionWindow,

    #[error("error appending ledgers: ledgers not contiguous: expected ledger sequence {expected} but received {received}")]
    NonContiguousLedger { expected: u32, received: u32 },

    #[error("malformed ledger close meta: {0}")]
    MalformedLedger(#[from] LedgerMetaError),

    #[error("{source} (rollback failed: {rollback})")]
    RollbackFailed {
        source: Box<FeeWindowError>,
        rollback: String,
    },
}

impl FeeWindowError {
    /// Joins an ingestion failure with the outcome of the storage rollback it triggered
    pub fn join_rollback(self, rollback: crate::Result<()>) -> Self {
        match rollback {
            Ok(()) => self,
            Err(e) => FeeWindowError::RollbackFailed {
                source: Box::new(self),
                rollback: e.to_string(),
            },
        }
    }
}
