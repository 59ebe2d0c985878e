// Warm the fee windows from already-ingested ledgers at startup

use crate::error::Result;
use crate::feewindow::FeeWindows;
use crate::port::{LedgerReader, ReadWriter};
use tracing::info;

/// Ledgers fetched per storage round trip
const BACKFILL_BATCH_SIZE: u32 = 100;

/// Replays the trailing `retention` stored ledgers through the fee windows.
///
/// Returns the number of ledgers replayed. The windows must be empty.
pub async fn backfill_fee_windows(
    fee_windows: &FeeWindows,
    reader: &dyn LedgerReader,
    read_writer: &dyn ReadWriter,
    retention: u32,
) -> Result<u32> {
    let Some(range) = reader.get_ledger_range().await? else {
        info!("Ledger store is empty, skipping fee window backfill");
        return Ok(0);
    };
    let range = range.tail(retention);
    info!(
        first = range.first,
        last = range.last,
        "Backfilling fee windows"
    );

    let mut tx = read_writer.new_tx().await?;
    let mut next = range.first;
    let mut replayed = 0u32;
    while next <= range.last {
        let limit = BACKFILL_BATCH_SIZE.min(range.last - next + 1);
        let ledgers = reader.get_ledgers(next, limit).await?;
        if ledgers.is_empty() {
            break;
        }
        for meta in &ledgers {
            fee_windows.ingest_fees(meta, tx.as_mut()).await?;
            replayed += 1;
        }
        match ledgers.last() {
            Some(last) if last.sequence < range.last => next = last.sequence + 1,
            _ => break,
        }
    }
    tx.commit().await?;

    info!(ledgers = replayed, "Fee window backfill completed");
    Ok(replayed)
}
