//! Assembly of one container's [`ContainerStats`] from a raw sample.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::StatsCache;
use crate::container::ContainerAttributes;
use crate::error::Result;
use crate::metrics::{RawMetrics, RawSample};
use crate::stats::{
    self, ContainerStats, FileSystemStats, FilesystemIdentifier, FilesystemUsageResolver,
    UInt64Value,
};
use crate::store::SnapshotSizeProvider;

/// Turns raw samples into normalized stats, remembering CPU samples in a shared [`StatsCache`].
#[derive(Debug)]
pub struct StatsAssembler<S> {
    resolver: FilesystemUsageResolver<S>,
    cache: Arc<StatsCache>,
    fs_mountpoint: String,
}

impl<S> StatsAssembler<S>
where
    S: SnapshotSizeProvider,
{
    /// Creates an assembler reading writable-layer usage from `snapshots`.
    ///
    /// # Arguments
    ///
    /// * `snapshots` - Provider of writable-layer usage.
    /// * `cache` - Previous CPU samples; may be shared with other assemblers.
    /// * `fs_mountpoint` - Mountpoint reported as the writable layer's filesystem.
    pub fn new(snapshots: S, cache: Arc<StatsCache>, fs_mountpoint: impl Into<String>) -> Self {
        Self {
            resolver: FilesystemUsageResolver::new(snapshots),
            cache,
            fs_mountpoint: fs_mountpoint.into(),
        }
    }

    pub fn cache(&self) -> &Arc<StatsCache> {
        &self.cache
    }

    /// Collects the stats of the container described by `attributes`.
    ///
    /// Without a `sample` (the container has no task reporting metrics) only
    /// the attributes and the writable layer are filled in. CPU, memory and
    /// process records that the sample does not carry are left out.
    ///
    /// The CPU sample is committed to the cache after the last suspension
    /// point, so dropping the returned future never leaves a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`crate::metrics::Error`] (wrapped in [`crate::Error::Metrics`])
    /// if the sample's encoding is unknown or its payload is malformed.
    pub async fn collect_stats(
        &self,
        attributes: &ContainerAttributes,
        sample: Option<&RawSample>,
    ) -> Result<ContainerStats> {
        let container_id = &attributes.id;
        let decoded = sample
            .map(|sample| RawMetrics::decode(&sample.data).map(|m| (m, sample.timestamp_nanos())))
            .transpose()?;

        let layer = self.resolver.resolve(container_id).await;
        let layer_timestamp = layer
            .timestamp
            .or(decoded.as_ref().map(|(_, timestamp)| *timestamp))
            .unwrap_or_else(now_nanos);

        let mut stats = ContainerStats {
            attributes: attributes.clone(),
            cpu: None,
            memory: None,
            writable_layer: FileSystemStats {
                timestamp: layer_timestamp,
                fs_id: FilesystemIdentifier {
                    mountpoint: self.fs_mountpoint.clone(),
                },
                used_bytes: layer.used_bytes.into(),
                inodes_used: layer.inodes_used.into(),
            },
            process: None,
        };

        if let Some((metrics, timestamp)) = decoded {
            stats.memory = stats::extract_memory(&metrics, timestamp);
            stats.process = stats::extract_process(&metrics, timestamp);
            stats.cpu = stats::extract_cpu(&metrics, timestamp).map(|mut cpu| {
                cpu.usage_nano_cores = self
                    .cache
                    .observe(container_id, cpu.sample())
                    .map(UInt64Value::from);
                cpu
            });
        }

        log::trace!(
            "collected stats: container_id={}, cpu={}, memory={}, process={}",
            container_id,
            stats.cpu.is_some(),
            stats.memory.is_some(),
            stats.process.is_some()
        );
        Ok(stats)
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
