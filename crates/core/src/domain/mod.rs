// Domain Layer - Ledger-close metadata model

pub mod ledger;

// Re-exports
pub use ledger::{
    LedgerCloseMeta, LedgerMetaError, LedgerTransaction, LedgerTransactionReader, OperationType,
    SorobanMetaExt, SorobanTransactionMeta, TransactionEnvelope, TransactionMeta,
    TransactionResultMeta,
};
