// Fixed-capacity ring of per-ledger buckets

use super::FeeWindowError;

/// Per-ledger aggregate, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBucket<T> {
    pub ledger_seq: u32,
    pub ledger_close_timestamp: i64,
    pub bucket_content: T,
}

/// Sliding window over the last `retention` contiguous ledgers
///
/// Buckets must arrive in strictly increasing, gap-free sequence order.
/// Once the window is full, every append evicts the oldest bucket.
#[derive(Debug)]
pub struct LedgerBucketWindow<T> {
    buckets: Vec<LedgerBucket<T>>,
    capacity: usize,
    start: usize,
}

impl<T> LedgerBucketWindow<T> {
    pub fn new(retention: u32) -> Result<Self, FeeWindowError> {
        if retention == 0 {
            return Err(FeeWindowError::EmptyRetentionWindow);
        }
        let capacity = retention as usize;
        Ok(Self {
            buckets: Vec::with_capacity(capacity),
            capacity,
            start: 0,
        })
    }

    /// Appends a bucket, returning the evicted one when the window was full
    pub fn append(
        &mut self,
        bucket: LedgerBucket<T>,
    ) -> Result<Option<LedgerBucket<T>>, FeeWindowError> {
        let length = self.buckets.len();
        if let Some(first) = self.get(0) {
            let expected = first.ledger_seq.wrapping_add(length as u32);
            if expected != bucket.ledger_seq {
                return Err(FeeWindowError::NonContiguousLedger {
                    expected,
                    received: bucket.ledger_seq,
                });
            }
        }

        if length < self.capacity {
            self.buckets.push(bucket);
            return Ok(None);
        }

        let evicted = std::mem::replace(&mut self.buckets[self.start], bucket);
        self.start = (self.start + 1) % self.capacity;
        Ok(Some(evicted))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bucket at position `i`, 0 being the oldest
    pub fn get(&self, i: usize) -> Option<&LedgerBucket<T>> {
        if i >= self.buckets.len() {
            return None;
        }
        self.buckets.get((self.start + i) % self.buckets.len())
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &LedgerBucket<T>> {
        (0..self.buckets.len()).filter_map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(seq: u32) -> LedgerBucket<u32> {
        LedgerBucket {
            ledger_seq: seq,
            ledger_close_timestamp: seq as i64 * 5,
            bucket_content: seq,
        }
    }

    #[test]
    fn test_zero_retention_rejected() {
        assert!(matches!(
            LedgerBucketWindow::<u32>::new(0),
            Err(FeeWindowError::EmptyRetentionWindow)
        ));
    }

    #[test]
    fn test_append_until_full() {
        let mut window = LedgerBucketWindow::new(3).unwrap();
        for seq in 5..8 {
            assert!(window.append(bucket(seq)).unwrap().is_none());
        }
        assert_eq!(window.len(), 3);
        let seqs: Vec<u32> = window.iter().map(|b| b.ledger_seq).collect();
        assert_eq!(seqs, vec![5, 6, 7]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut window = LedgerBucketWindow::new(3).unwrap();
        for seq in 1..=3 {
            window.append(bucket(seq)).unwrap();
        }

        let evicted = window.append(bucket(4)).unwrap().unwrap();
        assert_eq!(evicted.ledger_seq, 1);
        let evicted = window.append(bucket(5)).unwrap().unwrap();
        assert_eq!(evicted.ledger_seq, 2);

        assert_eq!(window.len(), 3);
        assert_eq!(window.get(0).unwrap().ledger_seq, 3);
        assert_eq!(window.get(2).unwrap().ledger_seq, 5);
        assert!(window.get(3).is_none());
    }

    #[test]
    fn test_non_contiguous_append_rejected() {
        let mut window = LedgerBucketWindow::new(2).unwrap();
        window.append(bucket(10)).unwrap();

        let err = window.append(bucket(12)).unwrap_err();
        assert!(matches!(
            err,
            FeeWindowError::NonContiguousLedger {
                expected: 11,
                received: 12
            }
        ));

        // Replaying the same ledger is also a gap in the sequence
        assert!(window.append(bucket(10)).is_err());
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_contiguity_checked_after_wraparound() {
        let mut window = LedgerBucketWindow::new(2).unwrap();
        for seq in 1..=5 {
            window.append(bucket(seq)).unwrap();
        }
        assert!(window.append(bucket(7)).is_err());
        assert!(window.append(bucket(6)).is_ok());
    }
}
