// Fee window: bucket window plus cached distribution behind one lock

use super::{FeeDistribution, FeeWindowError, LedgerBucket, LedgerBucketWindow};
use parking_lot::RwLock;

struct Inner {
    fees_per_ledger: LedgerBucketWindow<Vec<u64>>,
    distribution: FeeDistribution,
}

/// Sliding window of per-ledger fees with a precomputed distribution.
///
/// Writers recompute the whole distribution under the write lock, so readers
/// only ever see a distribution that matches the retained buckets.
pub struct FeeWindow {
    inner: RwLock<Inner>,
}

impl FeeWindow {
    pub fn new(retention_window: u32) -> Result<Self, FeeWindowError> {
        Ok(Self {
            inner: RwLock::new(Inner {
                fees_per_ledger: LedgerBucketWindow::new(retention_window)?,
                distribution: FeeDistribution::default(),
            }),
        })
    }

    pub fn append_ledger_fees(&self, fees: LedgerBucket<Vec<u64>>) -> Result<(), FeeWindowError> {
        let mut inner = self.inner.write();
        inner.fees_per_ledger.append(fees)?;

        let mut all_fees: Vec<u64> = inner
            .fees_per_ledger
            .iter()
            .flat_map(|bucket| bucket.bucket_content.iter().copied())
            .collect();
        let ledger_count = inner.fees_per_ledger.len() as u32;
        inner.distribution = FeeDistribution::compute(&mut all_fees, ledger_count);
        Ok(())
    }

    pub fn get_fee_distribution(&self) -> FeeDistribution {
        self.inner.read().distribution
    }

    /// Sequence of the newest retained ledger
    pub fn latest_ledger(&self) -> Option<u32> {
        let inner = self.inner.read();
        let len = inner.fees_per_ledger.len();
        len.checked_sub(1)
            .and_then(|i| inner.fees_per_ledger.get(i))
            .map(|bucket| bucket.ledger_seq)
    }
}
