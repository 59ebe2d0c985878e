// getLedgers: paginated ledger-close metadata

use super::{latest_ledger, ledger_range};
use crate::error::RpcError;
use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::{GetLedgersRequest, GetLedgersResponse, LedgerEntry};
use async_trait::async_trait;
use ledger_rpc_core::port::{LedgerReader, LedgerSeqRange};
use std::sync::Arc;

pub struct GetLedgers {
    ledger_reader: Arc<dyn LedgerReader>,
    max_limit: u32,
    default_limit: u32,
}

impl GetLedgers {
    pub fn new(ledger_reader: Arc<dyn LedgerReader>, max_limit: u32, default_limit: u32) -> Self {
        Self {
            ledger_reader,
            max_limit,
            default_limit,
        }
    }

    /// Resolves the first sequence to return and the page size
    fn page(&self, req: &GetLedgersRequest, range: LedgerSeqRange) -> Result<(u32, u32), RpcError> {
        let pagination = req.pagination.clone().unwrap_or_default();

        let limit = match pagination.limit {
            0 => self.default_limit,
            limit if limit > self.max_limit => {
                return Err(RpcError::InvalidParams(format!(
                    "limit must not exceed {}",
                    self.max_limit
                )))
            }
            limit => limit,
        };

        let start = match pagination.cursor {
            Some(_) if req.start_ledger != 0 => {
                return Err(RpcError::InvalidParams(
                    "startLedger and cursor cannot both be set".to_string(),
                ))
            }
            Some(cursor) => cursor
                .parse::<u32>()
                .map_err(|e| RpcError::InvalidParams(format!("invalid cursor {cursor:?}: {e}")))?
                .saturating_add(1),
            None => {
                if req.start_ledger < range.first || req.start_ledger > range.last {
                    return Err(RpcError::InvalidParams(format!(
                        "start ledger must be between the oldest ledger: {} and the latest ledger: {} for this rpc instance",
                        range.first, range.last
                    )));
                }
                req.start_ledger
            }
        };
        Ok((start, limit))
    }
}

#[async_trait]
impl Handler for GetLedgers {
    async fn handle(&self, request: Request) -> HandlerResult {
        let req: GetLedgersRequest = request.parse_params()?;
        let reader = self.ledger_reader.as_ref();
        let range = ledger_range(reader).await?;
        let (start, limit) = self.page(&req, range)?;

        let ledgers = reader.get_ledgers(start, limit).await?;
        let latest = latest_ledger(reader).await?;
        let oldest_close_time = reader
            .get_ledgers(range.first, 1)
            .await?
            .first()
            .map(|l| l.close_time)
            .unwrap_or_default();

        let cursor = ledgers
            .last()
            .map(|l| l.sequence)
            .unwrap_or(start.saturating_sub(1));
        let ledgers = ledgers
            .into_iter()
            .map(|meta| LedgerEntry {
                hash: meta.hash.clone(),
                sequence: meta.sequence,
                ledger_close_time: meta.close_time.to_string(),
                metadata_json: meta,
            })
            .collect();

        to_result(GetLedgersResponse {
            ledgers,
            latest_ledger: latest.sequence,
            latest_ledger_close_time: latest.close_time,
            oldest_ledger: range.first,
            oldest_ledger_close_time: oldest_close_time,
            cursor: cursor.to_string(),
        })
    }
}
