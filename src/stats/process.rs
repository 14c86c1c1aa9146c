use crate::metrics::RawMetrics;

use super::ProcessStats;

/// Extracts the task counters (`pids` controller) of `metrics`.
///
/// Both hierarchies expose the same `current`/`limit` pair. Returns `None` if
/// the payload has no pids statistics.
pub fn extract_process(metrics: &RawMetrics, timestamp: i64) -> Option<ProcessStats> {
    let (current, limit) = match metrics {
        RawMetrics::V1(metrics) => metrics.pids.as_ref().map(|p| (p.current, p.limit))?,
        RawMetrics::V2(metrics) => metrics.pids.as_ref().map(|p| (p.current, p.limit))?,
    };

    Some(ProcessStats {
        timestamp,
        threads_max: limit.into(),
        threads_count: current.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{v1, v2};

    #[test]
    fn test_extract_process_both_versions() {
        let metrics = RawMetrics::V1(v1::Metrics {
            pids: Some(v1::PidsStat {
                current: 12,
                limit: 0,
            }),
            ..Default::default()
        });
        let process = extract_process(&metrics, 3).unwrap();
        assert_eq!(process.timestamp, 3);
        assert_eq!(process.threads_count.value, 12);
        assert_eq!(process.threads_max.value, 0);

        let metrics = RawMetrics::V2(v2::Metrics {
            pids: Some(v2::PidsStat {
                current: 4,
                limit: 1024,
            }),
            ..Default::default()
        });
        let process = extract_process(&metrics, 4).unwrap();
        assert_eq!(process.threads_count.value, 4);
        assert_eq!(process.threads_max.value, 1024);
    }

    #[test]
    fn test_extract_process_absent() {
        assert_eq!(extract_process(&RawMetrics::V1(v1::Metrics::default()), 0), None);
        assert_eq!(extract_process(&RawMetrics::V2(v2::Metrics::default()), 0), None);
    }
}
