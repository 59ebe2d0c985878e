// getLatestLedger

use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::GetLatestLedgerResponse;
use async_trait::async_trait;
use ledger_rpc_core::port::LedgerReader;
use std::sync::Arc;

pub struct GetLatestLedger {
    ledger_reader: Arc<dyn LedgerReader>,
}

impl GetLatestLedger {
    pub fn new(ledger_reader: Arc<dyn LedgerReader>) -> Self {
        Self { ledger_reader }
    }
}

#[async_trait]
impl Handler for GetLatestLedger {
    async fn handle(&self, _request: Request) -> HandlerResult {
        let latest = super::latest_ledger(self.ledger_reader.as_ref()).await?;
        to_result(GetLatestLedgerResponse {
            id: latest.hash,
            sequence: latest.sequence,
            protocol_version: latest.protocol_version,
        })
    }
}
