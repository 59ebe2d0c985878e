// Transaction port for atomic ledger ingestion

use crate::domain::LedgerCloseMeta;
use crate::error::Result;
use async_trait::async_trait;

/// Opens write transactions against the ledger store
#[async_trait]
pub trait ReadWriter: Send + Sync {
    /// Begin a new write transaction
    async fn new_tx(&self) -> Result<Box<dyn WriteTx>>;
}

/// One write transaction
///
/// `commit` and `rollback` finish the transaction; calling either a second
/// time returns `AppError::InvalidState`.
#[async_trait]
pub trait WriteTx: Send {
    /// Persist a closed ledger (within transaction)
    async fn insert_ledger(&mut self, meta: &LedgerCloseMeta) -> Result<()>;

    /// Commit the transaction
    async fn commit(&mut self) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(&mut self) -> Result<()>;
}
