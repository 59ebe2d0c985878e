// Classic and smart-contract inclusion fee windows fed from ledger-close metadata

use super::{FeeDistribution, FeeWindow, FeeWindowError, LedgerBucket};
use crate::domain::{LedgerCloseMeta, LedgerTransactionReader};
use crate::port::WriteTx;
use tracing::{debug, warn};

/// Per-ledger fee series derived from one ledger
#[derive(Debug, Default, PartialEq, Eq)]
struct LedgerFees {
    classic: Vec<u64>,
    soroban_inclusion: Vec<u64>,
}

pub struct FeeWindows {
    soroban_inclusion_fee_window: FeeWindow,
    classic_fee_window: FeeWindow,
    network_passphrase: String,
}

impl FeeWindows {
    pub fn new(
        classic_retention: u32,
        soroban_retention: u32,
        network_passphrase: impl Into<String>,
    ) -> Result<Self, FeeWindowError> {
        Ok(Self {
            soroban_inclusion_fee_window: FeeWindow::new(soroban_retention)?,
            classic_fee_window: FeeWindow::new(classic_retention)?,
            network_passphrase: network_passphrase.into(),
        })
    }

    pub fn classic(&self) -> &FeeWindow {
        &self.classic_fee_window
    }

    pub fn soroban_inclusion(&self) -> &FeeWindow {
        &self.soroban_inclusion_fee_window
    }

    pub fn classic_fee_distribution(&self) -> FeeDistribution {
        self.classic_fee_window.get_fee_distribution()
    }

    pub fn soroban_inclusion_fee_distribution(&self) -> FeeDistribution {
        self.soroban_inclusion_fee_window.get_fee_distribution()
    }

    /// Feeds one closed ledger into both windows.
    ///
    /// On failure the owning storage transaction is rolled back and the
    /// rollback outcome is joined into the returned error.
    pub async fn ingest_fees(
        &self,
        meta: &LedgerCloseMeta,
        tx: &mut dyn WriteTx,
    ) -> Result<(), FeeWindowError> {
        let Err(err) = self.append_ledger(meta) else {
            return Ok(());
        };
        warn!(
            ledger = meta.sequence,
            error = %err,
            "Fee ingestion failed, rolling back ledger transaction"
        );
        let rollback = tx.rollback().await;
        Err(err.join_rollback(rollback))
    }

    fn append_ledger(&self, meta: &LedgerCloseMeta) -> Result<(), FeeWindowError> {
        let fees = self.ledger_fees(meta)?;
        debug!(
            ledger = meta.sequence,
            classic = fees.classic.len(),
            soroban = fees.soroban_inclusion.len(),
            "Appending ledger fees"
        );

        let mut bucket = LedgerBucket {
            ledger_seq: meta.ledger_sequence(),
            ledger_close_timestamp: meta.ledger_close_time(),
            bucket_content: fees.classic,
        };
        self.classic_fee_window.append_ledger_fees(bucket.clone())?;
        bucket.bucket_content = fees.soroban_inclusion;
        self.soroban_inclusion_fee_window.append_ledger_fees(bucket)
    }

    fn ledger_fees(&self, meta: &LedgerCloseMeta) -> Result<LedgerFees, FeeWindowError> {
        let reader = LedgerTransactionReader::new(&self.network_passphrase, meta)?;
        let mut fees = LedgerFees::default();

        for tx in reader {
            let fee_charged = tx.fee_charged();
            let ops = tx.operations();
            if ops.is_empty() {
                // should not happen
                continue;
            }
            if ops.len() == 1 && ops[0].is_soroban() {
                let Some(resource_fee) = tx.result.meta.resource_fee_charged() else {
                    continue;
                };
                let inclusion_fee = fee_charged.saturating_sub(resource_fee.max(0) as u64);
                fees.soroban_inclusion.push(inclusion_fee);
                continue;
            }
            fees.classic.push(fee_charged / ops.len() as u64);
        }
        Ok(fees)
    }
}
