// Fee distribution snapshot

/// Summary statistics over every fee retained by a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeDistribution {
    pub max: u64,
    pub min: u64,
    pub mode: u64,
    pub p10: u64,
    pub p20: u64,
    pub p30: u64,
    pub p40: u64,
    pub p50: u64,
    pub p60: u64,
    pub p70: u64,
    pub p80: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub fee_count: u32,
    pub ledger_count: u32,
}

impl FeeDistribution {
    /// Recomputes the distribution from scratch; `fees` is sorted in place
    pub fn compute(fees: &mut [u64], ledger_count: u32) -> Self {
        if fees.is_empty() {
            return FeeDistribution {
                ledger_count,
                ..Default::default()
            };
        }
        fees.sort_unstable();

        let count = fees.len();
        // nearest-rank: ceil(p * count / 100), 1-based
        let percentile = |p: u64| -> u64 {
            let kth = (p * count as u64).div_ceil(100).clamp(1, count as u64);
            fees[kth as usize - 1]
        };

        FeeDistribution {
            max: fees[count - 1],
            min: fees[0],
            mode: mode(fees),
            p10: percentile(10),
            p20: percentile(20),
            p30: percentile(30),
            p40: percentile(40),
            p50: percentile(50),
            p60: percentile(60),
            p70: percentile(70),
            p80: percentile(80),
            p90: percentile(90),
            p95: percentile(95),
            p99: percentile(99),
            fee_count: count as u32,
            ledger_count,
        }
    }
}

/// Value of the longest run in a sorted, non-empty slice.
///
/// Runs are scanned in ascending order and only a strictly longer run
/// replaces the current mode, except that the final run also wins when it
/// is strictly longer than every run before it.
fn mode(sorted: &[u64]) -> u64 {
    let mut mode = sorted[0];
    let mut last_val = sorted[0];
    let mut max_repetitions = 0usize;
    let mut local_repetitions = 0usize;

    for &fee in &sorted[1..] {
        if fee == last_val {
            local_repetitions += 1;
            continue;
        }
        if local_repetitions > max_repetitions {
            max_repetitions = local_repetitions;
            mode = last_val;
        }
        last_val = fee;
        local_repetitions = 0;
    }

    if local_repetitions > max_repetitions {
        mode = sorted[sorted.len() - 1];
    }
    mode
}
