// Ledger-close metadata model
//
// The canonical record of one closed ledger, as handed over by the ingestion
// pipeline. Only the fields the server consumes are modelled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that happened when a ledger closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCloseMeta {
    pub sequence: u32,
    /// Close time in unix seconds
    pub close_time: i64,
    pub hash: String,
    pub protocol_version: u32,
    /// Transaction set, in apply order
    #[serde(default)]
    pub transactions: Vec<TransactionEnvelope>,
    /// Processing results, one per envelope and in the same order
    #[serde(default)]
    pub tx_processing: Vec<TransactionResultMeta>,
}

impl LedgerCloseMeta {
    pub fn ledger_sequence(&self) -> u32 {
        self.sequence
    }

    pub fn ledger_close_time(&self) -> i64 {
        self.close_time
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Operation kinds relevant to fee classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateAccount,
    Payment,
    PathPaymentStrictReceive,
    PathPaymentStrictSend,
    ManageSellOffer,
    ManageBuyOffer,
    ChangeTrust,
    AccountMerge,
    ManageData,
    InvokeHostFunction,
    ExtendFootprintTtl,
    RestoreFootprint,
    /// Any other classic operation
    Other,
}

impl OperationType {
    /// Smart-contract operations are fee'd by metered resources
    pub fn is_soroban(self) -> bool {
        matches!(
            self,
            OperationType::InvokeHostFunction
                | OperationType::ExtendFootprintTtl
                | OperationType::RestoreFootprint
        )
    }
}

/// Signed transaction as submitted to the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub source_account: String,
    pub operations: Vec<OperationType>,
}

/// Outcome of applying one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResultMeta {
    pub fee_charged: i64,
    pub successful: bool,
    pub meta: TransactionMeta,
}

/// Versioned transaction apply metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "v", rename_all = "lowercase")]
pub enum TransactionMeta {
    V1,
    V2,
    V3 {
        #[serde(default, rename = "sorobanMeta")]
        soroban_meta: Option<SorobanTransactionMeta>,
    },
    V4 {
        #[serde(default, rename = "sorobanMeta")]
        soroban_meta: Option<SorobanTransactionMeta>,
    },
}

impl TransactionMeta {
    /// Resource fee charged, when this meta version carries it
    pub fn resource_fee_charged(&self) -> Option<i64> {
        let soroban_meta = match self {
            TransactionMeta::V3 { soroban_meta } | TransactionMeta::V4 { soroban_meta } => {
                soroban_meta.as_ref()?
            }
            _ => return None,
        };
        match soroban_meta.ext {
            SorobanMetaExt::V1 {
                total_non_refundable_resource_fee_charged,
                total_refundable_resource_fee_charged,
            } => Some(
                total_non_refundable_resource_fee_charged
                    .saturating_add(total_refundable_resource_fee_charged),
            ),
            SorobanMetaExt::V0 => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SorobanTransactionMeta {
    pub ext: SorobanMetaExt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "v", rename_all = "lowercase")]
pub enum SorobanMetaExt {
    V0,
    #[serde(rename_all = "camelCase")]
    V1 {
        total_non_refundable_resource_fee_charged: i64,
        total_refundable_resource_fee_charged: i64,
    },
}

/// Malformed ledger-close metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerMetaError {
    #[error("network passphrase must not be empty")]
    MissingNetworkPassphrase,

    #[error("ledger {sequence}: {envelopes} transaction envelopes but {results} processing results")]
    TransactionCountMismatch {
        sequence: u32,
        envelopes: usize,
        results: usize,
    },
}

/// One transaction of a ledger, envelope paired with its result
#[derive(Debug, Clone, Copy)]
pub struct LedgerTransaction<'a> {
    pub index: usize,
    pub envelope: &'a TransactionEnvelope,
    pub result: &'a TransactionResultMeta,
}

impl LedgerTransaction<'_> {
    pub fn operations(&self) -> &[OperationType] {
        &self.envelope.operations
    }

    pub fn fee_charged(&self) -> u64 {
        self.result.fee_charged.max(0) as u64
    }
}

/// Iterates the transactions of a ledger for a given network
pub struct LedgerTransactionReader<'a> {
    network_passphrase: &'a str,
    meta: &'a LedgerCloseMeta,
    next: usize,
}

impl<'a> LedgerTransactionReader<'a> {
    pub fn new(
        network_passphrase: &'a str,
        meta: &'a LedgerCloseMeta,
    ) -> Result<Self, LedgerMetaError> {
        if network_passphrase.is_empty() {
            return Err(LedgerMetaError::MissingNetworkPassphrase);
        }
        if meta.transactions.len() != meta.tx_processing.len() {
            return Err(LedgerMetaError::TransactionCountMismatch {
                sequence: meta.sequence,
                envelopes: meta.transactions.len(),
                results: meta.tx_processing.len(),
            });
        }
        Ok(Self {
            network_passphrase,
            meta,
            next: 0,
        })
    }

    pub fn network_passphrase(&self) -> &str {
        self.network_passphrase
    }
}

impl<'a> Iterator for LedgerTransactionReader<'a> {
    type Item = LedgerTransaction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let envelope = self.meta.transactions.get(index)?;
        let result = self.meta.tx_processing.get(index)?;
        self.next += 1;
        Some(LedgerTransaction {
            index,
            envelope,
            result,
        })
    }
}
