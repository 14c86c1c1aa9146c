//! CPU record extraction.
//!
//! The two hierarchies report CPU time in different units:
//!
//! - **cgroup v1** (`cpuacct`) counts nanoseconds, so `usage.total` is already
//!   the cumulative core-nanoseconds value.
//! - **cgroup v2** (`cpu.stat`) counts microseconds, so `usage_usec` is scaled
//!   by 1000.
//!
//! The `*_seconds_total` fields are copied from the raw counters without unit
//! conversion, in the unit the hierarchy reports them. The throttled-seconds
//! value divides a nanosecond counter down to whole seconds.
//!
//! The instantaneous rate is left unset here; it needs the previous sample and
//! is filled in by the [`StatsCache`](crate::cache::StatsCache).

use crate::cache::CpuSample;
use crate::metrics::{RawMetrics, v1, v2};

use super::{CpuStats, UInt64Value};

const NANOS_PER_SECOND: u64 = 1_000_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

/// Extracts the CPU record of `metrics` taken at `timestamp` (nanoseconds since the epoch).
///
/// Returns `None` if the payload carries no CPU usage.
pub fn extract_cpu(metrics: &RawMetrics, timestamp: i64) -> Option<CpuStats> {
    match metrics {
        RawMetrics::V1(metrics) => from_v1(metrics.cpu.as_ref()?, timestamp),
        RawMetrics::V2(metrics) => Some(from_v2(metrics.cpu.as_ref()?, timestamp)),
    }
}

fn from_v1(cpu: &v1::CpuStat, timestamp: i64) -> Option<CpuStats> {
    let usage = cpu.usage.as_ref()?;
    let throttling = cpu.throttling.as_ref();
    Some(CpuStats {
        timestamp,
        usage_core_nano_seconds: usage.total.into(),
        usage_nano_cores: None,
        cfs_throttled_periods_total: throttling.map(|t| t.throttled_periods.into()),
        cfs_throttled_seconds_total: throttling
            .map(|t| UInt64Value::from(t.throttled_time / NANOS_PER_SECOND)),
        system_seconds_total: Some(usage.kernel.into()),
        usage_seconds_total: Some(usage.total.into()),
        user_seconds_total: Some(usage.user.into()),
    })
}

fn from_v2(cpu: &v2::CpuStat, timestamp: i64) -> CpuStats {
    CpuStats {
        timestamp,
        usage_core_nano_seconds: cpu.usage_usec.saturating_mul(NANOS_PER_MICRO).into(),
        usage_nano_cores: None,
        // v2 reports `nr_periods` here and scales `nr_throttled` like a nanosecond counter.
        cfs_throttled_periods_total: Some(cpu.nr_periods.into()),
        cfs_throttled_seconds_total: Some((cpu.nr_throttled / NANOS_PER_SECOND).into()),
        system_seconds_total: Some(cpu.system_usec.into()),
        usage_seconds_total: Some(cpu.usage_usec.into()),
        user_seconds_total: Some(cpu.user_usec.into()),
    }
}

impl CpuStats {
    /// The cumulative sample this record contributes to rate computation.
    pub fn sample(&self) -> CpuSample {
        CpuSample {
            usage_core_nano_seconds: self.usage_core_nano_seconds.value,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_v1_cpu() {
        let metrics = RawMetrics::V1(v1::Metrics {
            cpu: Some(v1::CpuStat {
                usage: Some(v1::CpuUsage {
                    total: 5_000_000_000,
                    kernel: 2_000_000_000,
                    user: 3_000_000_000,
                    per_cpu: vec![2_500_000_000, 2_500_000_000],
                }),
                throttling: Some(v1::Throttle {
                    periods: 100,
                    throttled_periods: 7,
                    throttled_time: 3_500_000_000,
                }),
            }),
            ..Default::default()
        });

        let cpu = extract_cpu(&metrics, 42).unwrap();
        assert_eq!(cpu.timestamp, 42);
        assert_eq!(cpu.usage_core_nano_seconds.value, 5_000_000_000);
        assert_eq!(cpu.usage_nano_cores, None);
        assert_eq!(cpu.cfs_throttled_periods_total.map(|v| v.value), Some(7));
        assert_eq!(cpu.cfs_throttled_seconds_total.map(|v| v.value), Some(3));
        assert_eq!(cpu.system_seconds_total.map(|v| v.value), Some(2_000_000_000));
        assert_eq!(cpu.usage_seconds_total.map(|v| v.value), Some(5_000_000_000));
        assert_eq!(cpu.user_seconds_total.map(|v| v.value), Some(3_000_000_000));
    }

    #[test]
    fn test_extract_v1_cpu_without_throttling() {
        let metrics = RawMetrics::V1(v1::Metrics {
            cpu: Some(v1::CpuStat {
                usage: Some(v1::CpuUsage {
                    total: 10,
                    ..Default::default()
                }),
                throttling: None,
            }),
            ..Default::default()
        });

        let cpu = extract_cpu(&metrics, 0).unwrap();
        assert_eq!(cpu.usage_core_nano_seconds.value, 10);
        assert_eq!(cpu.cfs_throttled_periods_total, None);
        assert_eq!(cpu.cfs_throttled_seconds_total, None);
    }

    #[test]
    fn test_extract_v1_cpu_absent() {
        let no_cpu = RawMetrics::V1(v1::Metrics::default());
        assert_eq!(extract_cpu(&no_cpu, 0), None);

        let no_usage = RawMetrics::V1(v1::Metrics {
            cpu: Some(v1::CpuStat {
                usage: None,
                throttling: Some(v1::Throttle::default()),
            }),
            ..Default::default()
        });
        assert_eq!(extract_cpu(&no_usage, 0), None);
    }

    #[test]
    fn test_extract_v2_cpu() {
        let metrics = RawMetrics::V2(v2::Metrics {
            cpu: Some(v2::CpuStat {
                usage_usec: 623_932_088,
                user_usec: 421_230_248,
                system_usec: 202_701_840,
                nr_periods: 12,
                nr_throttled: 4_000_000_000,
                throttled_usec: 50_000,
            }),
            ..Default::default()
        });

        let cpu = extract_cpu(&metrics, 9).unwrap();
        assert_eq!(cpu.usage_core_nano_seconds.value, 623_932_088_000);
        assert_eq!(cpu.cfs_throttled_periods_total.map(|v| v.value), Some(12));
        assert_eq!(cpu.cfs_throttled_seconds_total.map(|v| v.value), Some(4));
        assert_eq!(cpu.system_seconds_total.map(|v| v.value), Some(202_701_840));
        assert_eq!(cpu.usage_seconds_total.map(|v| v.value), Some(623_932_088));
        assert_eq!(cpu.user_seconds_total.map(|v| v.value), Some(421_230_248));
        assert_eq!(
            cpu.sample(),
            CpuSample {
                usage_core_nano_seconds: 623_932_088_000,
                timestamp: 9,
            }
        );
    }

    #[test]
    fn test_extract_v2_cpu_absent() {
        let metrics = RawMetrics::V2(v2::Metrics {
            memory: Some(v2::MemoryStat::default()),
            ..Default::default()
        });
        assert_eq!(extract_cpu(&metrics, 0), None);
    }
}
