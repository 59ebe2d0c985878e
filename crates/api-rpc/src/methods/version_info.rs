// getVersionInfo

use super::latest_ledger;
use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::GetVersionInfoResponse;
use async_trait::async_trait;
use ledger_rpc_core::port::LedgerReader;
use std::sync::Arc;

pub struct GetVersionInfo {
    ledger_reader: Arc<dyn LedgerReader>,
    version: String,
    build_timestamp: Option<String>,
}

impl GetVersionInfo {
    pub fn new(
        ledger_reader: Arc<dyn LedgerReader>,
        version: impl Into<String>,
        build_timestamp: Option<String>,
    ) -> Self {
        Self {
            ledger_reader,
            version: version.into(),
            build_timestamp,
        }
    }
}

#[async_trait]
impl Handler for GetVersionInfo {
    async fn handle(&self, _request: Request) -> HandlerResult {
        let latest = latest_ledger(self.ledger_reader.as_ref()).await?;
        to_result(GetVersionInfoResponse {
            version: self.version.clone(),
            build_timestamp: self.build_timestamp.clone(),
            protocol_version: latest.protocol_version,
        })
    }
}
