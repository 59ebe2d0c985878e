// Application Layer - Use Cases

pub mod backfill;
pub mod ingest;

// Re-exports
pub use backfill::backfill_fee_windows;
pub use ingest::LedgerIngestor;
