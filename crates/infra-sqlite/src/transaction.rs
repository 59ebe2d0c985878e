// SQLite Write Transaction

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use ledger_rpc_core::domain::LedgerCloseMeta;
use ledger_rpc_core::error::{AppError, Result};
use ledger_rpc_core::port::WriteTx;
use sqlx::{Sqlite, Transaction as SqlxTransaction};

/// Write transaction over the ledger store
///
/// The inner sqlx transaction is taken on commit/rollback, so a finished
/// transaction reports `InvalidState` instead of touching the connection.
pub struct SqliteWriteTx {
    tx: Option<SqlxTransaction<'static, Sqlite>>,
}

impl SqliteWriteTx {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx: Some(tx) }
    }

    fn active(&mut self) -> Result<&mut SqlxTransaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::InvalidState("transaction already finished".to_string()))
    }

    fn finish(&mut self) -> Result<SqlxTransaction<'static, Sqlite>> {
        self.tx
            .take()
            .ok_or_else(|| AppError::InvalidState("transaction already finished".to_string()))
    }
}

#[async_trait]
impl WriteTx for SqliteWriteTx {
    async fn insert_ledger(&mut self, meta: &LedgerCloseMeta) -> Result<()> {
        let encoded = serde_json::to_string(meta)?;
        let tx = self.active()?;

        sqlx::query(
            r#"
            INSERT INTO ledger_close_meta (sequence, close_time, protocol_version, hash, meta)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(meta.sequence as i64)
        .bind(meta.close_time)
        .bind(meta.protocol_version as i64)
        .bind(&meta.hash)
        .bind(encoded)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.finish()?.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.finish()?.rollback().await.map_err(map_sqlx_error)
    }
}
