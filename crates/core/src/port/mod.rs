// Port Layer - Interfaces for external dependencies

pub mod ledger_reader;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use ledger_reader::{LedgerInfo, LedgerReader, LedgerSeqRange};
pub use time_provider::TimeProvider;
pub use transaction::{ReadWriter, WriteTx};
