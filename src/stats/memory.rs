//! Memory record extraction.
//!
//! Working set is usage minus inactive file-backed pages, clamped at zero, so it
//! never exceeds usage. Available bytes is the limit minus the working set,
//! except that a limit at or above [`UNLIMITED_THRESHOLD`] counts as "no limit"
//! and yields zero.
//!
//! cgroup v2 has no direct RSS counter. Its anonymous memory (`anon`) is
//! reported as RSS instead, the same approximation cAdvisor uses for the
//! unified hierarchy. This is not the same quantity as v1's `total_rss`.

use crate::metrics::{RawMetrics, v1, v2};

use super::MemoryStats;

/// Limits at or above this value are treated as unlimited.
///
/// The kernel rounds the "max" limit to a page multiple, so it never equals
/// `u64::MAX` (or `i64::MAX`) exactly.
pub const UNLIMITED_THRESHOLD: u64 = 1 << 62;

/// Returns whether a memory limit means "no effective limit".
pub fn is_unlimited(limit: u64) -> bool {
    limit >= UNLIMITED_THRESHOLD
}

/// Extracts the memory record of `metrics` taken at `timestamp` (nanoseconds since the epoch).
///
/// Returns `None` if the payload carries no memory usage.
pub fn extract_memory(metrics: &RawMetrics, timestamp: i64) -> Option<MemoryStats> {
    match metrics {
        RawMetrics::V1(metrics) => from_v1(metrics.memory.as_ref()?, timestamp),
        RawMetrics::V2(metrics) => Some(from_v2(metrics.memory.as_ref()?, timestamp)),
    }
}

fn working_set(usage: u64, inactive_file: u64) -> u64 {
    usage.saturating_sub(inactive_file)
}

fn available(limit: u64, working_set: u64) -> u64 {
    if is_unlimited(limit) {
        0
    } else {
        limit.saturating_sub(working_set)
    }
}

fn from_v1(memory: &v1::MemoryStat, timestamp: i64) -> Option<MemoryStats> {
    let usage = memory.usage.as_ref()?;
    let working_set_bytes = working_set(usage.usage, memory.total_inactive_file);
    Some(MemoryStats {
        timestamp,
        working_set_bytes: working_set_bytes.into(),
        available_bytes: available(usage.limit, working_set_bytes).into(),
        usage_bytes: usage.usage.into(),
        rss_bytes: memory.total_rss.into(),
        page_faults: memory.total_pg_fault.into(),
        major_page_faults: memory.total_pg_maj_fault.into(),
        cache_bytes: memory.cache.into(),
        fail_count: Some(usage.failcnt.into()),
        max_usage_bytes: Some(usage.max.into()),
    })
}

fn from_v2(memory: &v2::MemoryStat, timestamp: i64) -> MemoryStats {
    let working_set_bytes = working_set(memory.usage, memory.inactive_file);
    MemoryStats {
        timestamp,
        working_set_bytes: working_set_bytes.into(),
        available_bytes: available(memory.usage_limit, working_set_bytes).into(),
        usage_bytes: memory.usage.into(),
        rss_bytes: memory.anon.into(),
        page_faults: memory.pgfault.into(),
        major_page_faults: memory.pgmajfault.into(),
        cache_bytes: memory.file.into(),
        fail_count: None,
        max_usage_bytes: None,
    }
}
