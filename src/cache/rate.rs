//! Instantaneous CPU rate from two cumulative samples.

use super::CpuSample;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Computes CPU usage in nano-cores between `prev` and `curr`.
///
/// One full core busy for the whole interval is `1_000_000_000`. Returns `None`
/// when no rate can be derived:
///
/// - there is no previous sample,
/// - the interval is zero or negative (duplicate sample or clock skew),
/// - the cumulative counter went backwards (counter reset).
///
/// # Examples
///
/// ```
/// use cri_stats::cache::{CpuSample, rate};
///
/// let prev = CpuSample { usage_core_nano_seconds: 1_000_000_000, timestamp: 0 };
/// let curr = CpuSample { usage_core_nano_seconds: 3_000_000_000, timestamp: 2_000_000_000 };
/// assert_eq!(rate::nano_cores(Some(&prev), &curr), Some(1_000_000_000));
/// assert_eq!(rate::nano_cores(None, &curr), None);
/// ```
pub fn nano_cores(prev: Option<&CpuSample>, curr: &CpuSample) -> Option<u64> {
    let prev = prev?;
    if curr.timestamp <= prev.timestamp {
        return None;
    }
    let usage = curr
        .usage_core_nano_seconds
        .checked_sub(prev.usage_core_nano_seconds)?;
    // positive, checked above
    let interval = curr.timestamp.abs_diff(prev.timestamp);

    let rate = u128::from(usage) * NANOS_PER_SECOND / u128::from(interval);
    Some(u64::try_from(rate).unwrap_or(u64::MAX))
}
