// Ledger RPC Infrastructure - SQLite Adapter
// Implements: LedgerReader, ReadWriter / WriteTx

mod connection;
mod error;
mod ledger_repository;
mod migration;
mod transaction;

pub use connection::create_pool;
pub use ledger_repository::SqliteLedgerRepository;
pub use migration::run_migrations;
pub use transaction::SqliteWriteTx;
