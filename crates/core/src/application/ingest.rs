// Ledger ingestion: persist a closed ledger and feed the fee windows atomically

use crate::domain::LedgerCloseMeta;
use crate::error::Result;
use crate::feewindow::FeeWindows;
use crate::port::ReadWriter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single writer for closed ledgers
///
/// Ledger close is sequential, so one ingestor drives both the store and the
/// fee windows. A fee window failure rolls back the ledger write.
pub struct LedgerIngestor {
    read_writer: Arc<dyn ReadWriter>,
    fee_windows: Arc<FeeWindows>,
}

impl LedgerIngestor {
    pub fn new(read_writer: Arc<dyn ReadWriter>, fee_windows: Arc<FeeWindows>) -> Self {
        Self {
            read_writer,
            fee_windows,
        }
    }

    /// Store `meta` and record its fees in one transaction
    ///
    /// An insert or fee window failure rolls the write back and leaves the
    /// windows untouched. A failed commit does not: the windows already hold
    /// the ledger, so they stay one ledger ahead of storage and a retry of
    /// the same sequence is rejected as non-contiguous.
    pub async fn ingest(&self, meta: &LedgerCloseMeta) -> Result<()> {
        let mut tx = self.read_writer.new_tx().await?;
        if let Err(e) = tx.insert_ledger(meta).await {
            // The insert error wins
            if let Err(rollback) = tx.rollback().await {
                warn!(
                    ledger = meta.sequence,
                    error = %rollback,
                    "Rollback after failed ledger insert failed"
                );
            }
            return Err(e);
        }

        self.fee_windows.ingest_fees(meta, tx.as_mut()).await?;
        tx.commit().await?;

        debug!(
            ledger = meta.sequence,
            transactions = meta.transaction_count(),
            "Ledger ingested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feewindow::FeeWindowError;
    use crate::port::WriteTx;
    use crate::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const PASSPHRASE: &str = "Test SDF Network ; September 2015";

    #[derive(Default)]
    struct Faults {
        fail_insert: AtomicBool,
        fail_commit: AtomicBool,
        fail_rollback: AtomicBool,
        rollbacks: AtomicUsize,
    }

    struct FaultyStore(Arc<Faults>);

    struct FaultyTx(Arc<Faults>);

    #[async_trait]
    impl ReadWriter for FaultyStore {
        async fn new_tx(&self) -> Result<Box<dyn WriteTx>> {
            Ok(Box::new(FaultyTx(Arc::clone(&self.0))))
        }
    }

    #[async_trait]
    impl WriteTx for FaultyTx {
        async fn insert_ledger(&mut self, _meta: &LedgerCloseMeta) -> Result<()> {
            if self.0.fail_insert.load(Ordering::SeqCst) {
                return Err(AppError::Database("disk full".to_string()));
            }
            Ok(())
        }

        async fn commit(&mut self) -> Result<()> {
            if self.0.fail_commit.load(Ordering::SeqCst) {
                return Err(AppError::Database("database is locked".to_string()));
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<()> {
            self.0.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_rollback.load(Ordering::SeqCst) {
                return Err(AppError::Database("connection lost".to_string()));
            }
            Ok(())
        }
    }

    fn empty_ledger(sequence: u32) -> LedgerCloseMeta {
        LedgerCloseMeta {
            sequence,
            close_time: 1_700_000_000 + sequence as i64 * 5,
            hash: format!("hash-{sequence}"),
            protocol_version: 22,
            transactions: vec![],
            tx_processing: vec![],
        }
    }

    fn ingestor(faults: &Arc<Faults>) -> (LedgerIngestor, Arc<FeeWindows>) {
        let windows = Arc::new(FeeWindows::new(10, 50, PASSPHRASE).unwrap());
        let store = Arc::new(FaultyStore(Arc::clone(faults)));
        (LedgerIngestor::new(store, Arc::clone(&windows)), windows)
    }

    #[tokio::test]
    async fn test_insert_error_survives_failed_rollback() {
        let faults = Arc::new(Faults::default());
        faults.fail_insert.store(true, Ordering::SeqCst);
        faults.fail_rollback.store(true, Ordering::SeqCst);
        let (ingestor, windows) = ingestor(&faults);

        let err = ingestor.ingest(&empty_ledger(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Database(ref msg) if msg == "disk full"));
        assert_eq!(faults.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(windows.classic().latest_ledger(), None);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_windows_ahead() {
        let faults = Arc::new(Faults::default());
        let (ingestor, windows) = ingestor(&faults);

        faults.fail_commit.store(true, Ordering::SeqCst);
        let err = ingestor.ingest(&empty_ledger(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(windows.classic().latest_ledger(), Some(1));
        assert_eq!(windows.soroban_inclusion().latest_ledger(), Some(1));

        // Retrying the same ledger is rejected by the windows
        faults.fail_commit.store(false, Ordering::SeqCst);
        let err = ingestor.ingest(&empty_ledger(1)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::FeeWindow(FeeWindowError::NonContiguousLedger {
                expected: 2,
                received: 1
            })
        ));
        assert_eq!(faults.rollbacks.load(Ordering::SeqCst), 1);

        ingestor.ingest(&empty_ledger(2)).await.unwrap();
        assert_eq!(windows.classic().latest_ledger(), Some(2));
    }
}
