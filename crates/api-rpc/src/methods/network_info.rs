// getNetwork

use super::latest_ledger;
use crate::handler::{to_result, Handler, HandlerResult, Request};
use crate::types::GetNetworkResponse;
use async_trait::async_trait;
use ledger_rpc_core::port::LedgerReader;
use std::sync::Arc;

pub struct GetNetwork {
    ledger_reader: Arc<dyn LedgerReader>,
    passphrase: String,
    friendbot_url: Option<String>,
}

impl GetNetwork {
    pub fn new(
        ledger_reader: Arc<dyn LedgerReader>,
        passphrase: impl Into<String>,
        friendbot_url: Option<String>,
    ) -> Self {
        Self {
            ledger_reader,
            passphrase: passphrase.into(),
            friendbot_url,
        }
    }
}

#[async_trait]
impl Handler for GetNetwork {
    async fn handle(&self, _request: Request) -> HandlerResult {
        let latest = latest_ledger(self.ledger_reader.as_ref()).await?;
        to_result(GetNetworkResponse {
            friendbot_url: self.friendbot_url.clone(),
            passphrase: self.passphrase.clone(),
            protocol_version: latest.protocol_version,
        })
    }
}
