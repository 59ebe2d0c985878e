// SQLite Ledger Repository

use crate::error::map_sqlx_error;
use crate::SqliteWriteTx;
use async_trait::async_trait;
use ledger_rpc_core::domain::LedgerCloseMeta;
use ledger_rpc_core::error::Result;
use ledger_rpc_core::port::{LedgerInfo, LedgerReader, LedgerSeqRange, ReadWriter, WriteTx};
use sqlx::{Row, SqlitePool};

pub struct SqliteLedgerRepository {
    pool: SqlitePool,
}

impl SqliteLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerReader for SqliteLedgerRepository {
    async fn get_ledger_range(&self) -> Result<Option<LedgerSeqRange>> {
        let row = sqlx::query(
            "SELECT MIN(sequence) AS first, MAX(sequence) AS last FROM ledger_close_meta",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let first: Option<i64> = row.try_get("first").map_err(map_sqlx_error)?;
        let last: Option<i64> = row.try_get("last").map_err(map_sqlx_error)?;
        Ok(match (first, last) {
            (Some(first), Some(last)) => Some(LedgerSeqRange {
                first: first as u32,
                last: last as u32,
            }),
            _ => None,
        })
    }

    async fn get_latest_ledger(&self) -> Result<Option<LedgerInfo>> {
        let row = sqlx::query(
            r#"
            SELECT sequence, hash, close_time, protocol_version
            FROM ledger_close_meta
            ORDER BY sequence DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(LedgerInfo {
            sequence: row.try_get::<i64, _>("sequence").map_err(map_sqlx_error)? as u32,
            hash: row.try_get("hash").map_err(map_sqlx_error)?,
            close_time: row.try_get("close_time").map_err(map_sqlx_error)?,
            protocol_version: row
                .try_get::<i64, _>("protocol_version")
                .map_err(map_sqlx_error)? as u32,
        }))
    }

    async fn get_ledgers(&self, start: u32, limit: u32) -> Result<Vec<LedgerCloseMeta>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT meta FROM ledger_close_meta
            WHERE sequence >= ?
            ORDER BY sequence ASC
            LIMIT ?
            "#,
        )
        .bind(start as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|meta| serde_json::from_str(meta).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl ReadWriter for SqliteLedgerRepository {
    async fn new_tx(&self) -> Result<Box<dyn WriteTx>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteWriteTx::new(tx)))
    }
}
