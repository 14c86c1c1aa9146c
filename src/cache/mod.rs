//! Per-container memory of the previous CPU sample.
//!
//! The instantaneous CPU rate needs two cumulative samples. [`StatsCache`]
//! keeps exactly one, the most recent, per container id and computes the rate
//! against it in [`StatsCache::observe`].
//!
//! # Concurrency
//!
//! Entries live in a [`DashMap`]. `observe` holds the entry's shard lock while
//! it reads the previous sample, computes the rate and stores the new sample,
//! so two collections racing for the same container cannot lose an update.
//! Collections for other containers only wait if they hash to the same shard,
//! and only for that short, non-blocking section.

pub mod rate;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::container::ContainerID;

/// One cumulative CPU reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    /// Cumulative CPU usage in core-nanoseconds.
    pub usage_core_nano_seconds: u64,
    /// Nanoseconds since the epoch.
    pub timestamp: i64,
}

/// Which path an observation took through the cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    /// The container had no sample yet.
    First,
    /// Rate against the replaced sample, if one can be derived.
    Subsequent(Option<u64>),
}

#[derive(Debug, Default)]
pub struct StatsCache {
    samples: DashMap<ContainerID, CpuSample>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sample` as the latest sample of `container_id` and returns the
    /// CPU rate in nano-cores since the previous one.
    ///
    /// The stored sample is overwritten in every case, also when no rate can be
    /// derived, so a counter reset becomes the baseline of the next call.
    pub fn observe(&self, container_id: &ContainerID, sample: CpuSample) -> Option<u64> {
        match self.record(container_id, sample) {
            Observation::First => None,
            Observation::Subsequent(rate) => rate,
        }
    }

    fn record(&self, container_id: &ContainerID, sample: CpuSample) -> Observation {
        match self.samples.entry(container_id.clone()) {
            Entry::Vacant(entry) => {
                log::debug!("first cpu sample: container_id={container_id}");
                entry.insert(sample);
                Observation::First
            }
            Entry::Occupied(mut entry) => {
                let prev = *entry.get();
                let rate = rate::nano_cores(Some(&prev), &sample);
                if rate.is_none() {
                    if sample.usage_core_nano_seconds < prev.usage_core_nano_seconds {
                        log::warn!(
                            "cpu usage went backwards, resetting baseline: container_id={}, prev={}, curr={}",
                            container_id,
                            prev.usage_core_nano_seconds,
                            sample.usage_core_nano_seconds
                        );
                    } else {
                        log::debug!(
                            "non-positive sample interval: container_id={}, prev_ts={}, curr_ts={}",
                            container_id,
                            prev.timestamp,
                            sample.timestamp
                        );
                    }
                }
                entry.insert(sample);
                Observation::Subsequent(rate)
            }
        }
    }

    /// Returns the latest recorded sample of `container_id`.
    pub fn get(&self, container_id: &ContainerID) -> Option<CpuSample> {
        self.samples.get(container_id).map(|entry| *entry.value())
    }

    /// Forgets `container_id`; called once its container record is deleted.
    pub fn remove(&self, container_id: &ContainerID) -> Option<CpuSample> {
        self.samples.remove(container_id).map(|(_, sample)| sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    fn id(raw: &str) -> ContainerID {
        ContainerID::new(raw).unwrap()
    }

    fn sample(usage_core_nano_seconds: u64, timestamp: i64) -> CpuSample {
        CpuSample {
            usage_core_nano_seconds,
            timestamp,
        }
    }

    #[test]
    fn test_first_observation_creates_entry() {
        let cache = StatsCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&id("c1")), None);

        assert_eq!(cache.observe(&id("c1"), sample(1_000_000_000, 0)), None);
        assert_eq!(cache.get(&id("c1")), Some(sample(1_000_000_000, 0)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_second_observation_yields_rate() {
        let cache = StatsCache::new();
        cache.observe(&id("c1"), sample(1_000_000_000, 0));

        let rate = cache.observe(&id("c1"), sample(3_000_000_000, 2_000_000_000));
        assert_eq!(rate, Some(1_000_000_000));
        assert_eq!(cache.get(&id("c1")), Some(sample(3_000_000_000, 2_000_000_000)));
    }

    #[test]
    fn test_counter_reset_replaces_baseline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let cache = StatsCache::new();
        cache.observe(&id("c1"), sample(5_000_000_000, 0));

        assert_eq!(cache.observe(&id("c1"), sample(1_000, 1_000_000_000)), None);
        assert_eq!(cache.get(&id("c1")), Some(sample(1_000, 1_000_000_000)));

        // the reset sample is the new baseline
        assert_eq!(
            cache.observe(&id("c1"), sample(500_001_000, 2_000_000_000)),
            Some(500_000_000)
        );
    }

    #[test]
    fn test_duplicate_timestamp_overwrites() {
        let cache = StatsCache::new();
        cache.observe(&id("c1"), sample(10, 100));
        assert_eq!(cache.observe(&id("c1"), sample(20, 100)), None);
        assert_eq!(cache.get(&id("c1")), Some(sample(20, 100)));
    }

    #[test]
    fn test_containers_are_independent() {
        let cache = StatsCache::new();
        cache.observe(&id("c1"), sample(0, 0));
        assert_eq!(cache.observe(&id("c2"), sample(1_000, 1_000)), None);
        assert_eq!(
            cache.observe(&id("c1"), sample(1_000_000_000, 1_000_000_000)),
            Some(1_000_000_000)
        );

        assert_eq!(cache.remove(&id("c1")), Some(sample(1_000_000_000, 1_000_000_000)));
        assert_eq!(cache.get(&id("c1")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_observations_distinct_containers() {
        const THREADS: usize = 8;
        const ROUNDS: u64 = 500;

        let cache = Arc::new(StatsCache::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                let container_id = id(&format!("c{t}"));
                std::thread::spawn(move || {
                    (0..ROUNDS)
                        .filter_map(|round| {
                            cache.observe(
                                &container_id,
                                sample(round * 1_000_000_000, (round as i64) * 1_000_000_000),
                            )
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        for handle in handles {
            let rates = handle.join().unwrap();
            // only the first observation of each container lacks a rate
            assert_eq!(rates.len() as u64, ROUNDS - 1);
            assert!(rates.iter().all(|&rate| rate == 1_000_000_000));
        }
        assert_eq!(cache.len(), THREADS);
        assert_eq!(
            cache.get(&id("c0")),
            Some(sample(
                (ROUNDS - 1) * 1_000_000_000,
                (ROUNDS as i64 - 1) * 1_000_000_000
            ))
        );
    }

    #[test]
    fn test_concurrent_observations_same_container() {
        const THREADS: u64 = 8;
        const ROUNDS: u64 = 500;
        const TOTAL: u64 = THREADS * ROUNDS;

        let cache = Arc::new(StatsCache::new());
        let counter = Arc::new(AtomicU64::new(0));
        let container_id = id("shared");

        // usage grows one core-second per second, so any increasing pair rates at one core
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let counter = Arc::clone(&counter);
                let container_id = container_id.clone();
                std::thread::spawn(move || {
                    let mut last_k = 0;
                    let observations: Vec<Observation> = (0..ROUNDS)
                        .map(|_| {
                            last_k = counter.fetch_add(1, Ordering::SeqCst) + 1;
                            cache.record(
                                &container_id,
                                sample(last_k * 1_000_000_000, (last_k as i64) * 1_000_000_000),
                            )
                        })
                        .collect();
                    (observations, last_k)
                })
            })
            .collect();

        let mut observations = Vec::new();
        let mut final_writes = Vec::new();
        for handle in handles {
            let (thread_observations, last_k) = handle.join().unwrap();
            observations.extend(thread_observations);
            final_writes.push(sample(last_k * 1_000_000_000, (last_k as i64) * 1_000_000_000));
        }
        assert_eq!(observations.len() as u64, TOTAL);

        let first = observations
            .iter()
            .filter(|o| **o == Observation::First)
            .count();
        assert_eq!(first, 1);
        assert!(observations.iter().all(|o| matches!(
            o,
            Observation::First | Observation::Subsequent(None | Some(1_000_000_000))
        )));

        // the surviving sample is the final write of one of the threads
        let last = cache.get(&container_id).unwrap();
        assert!(final_writes.contains(&last));
        assert_eq!(cache.len(), 1);
    }
}
