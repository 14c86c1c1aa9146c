//! Batch listing of container stats.

use std::sync::Arc;
use std::time::Duration;

use crate::assembler::StatsAssembler;
use crate::cache::StatsCache;
use crate::config::{BatchPolicy, Config};
use crate::container::{ContainerAttributes, ContainerID};
use crate::error::{Error, Result};
use crate::stats::ContainerStats;
use crate::store::{MetadataStore, MetricsSource, SnapshotSizeProvider};

/// Outcome of a batch listing.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Stats of the containers collected successfully, in request order.
    pub stats: Vec<ContainerStats>,
    /// Per-container failures. Always empty under [`BatchPolicy::FailFast`].
    pub failures: Vec<Error>,
}

/// Resolves container ids through a [`MetadataStore`], fetches their raw
/// samples from a [`MetricsSource`] and assembles their stats.
#[derive(Debug)]
pub struct StatsLister<M, R, S> {
    metadata: M,
    source: R,
    assembler: StatsAssembler<S>,
    policy: BatchPolicy,
    timeout: Option<Duration>,
}

impl<M, R, S> StatsLister<M, R, S>
where
    M: MetadataStore,
    R: MetricsSource,
    S: SnapshotSizeProvider,
{
    pub fn new(metadata: M, source: R, snapshots: S, config: &Config) -> Self {
        Self::with_cache(metadata, source, snapshots, Arc::new(StatsCache::new()), config)
    }

    /// Like [`StatsLister::new`], but sharing an existing CPU sample cache.
    pub fn with_cache(
        metadata: M,
        source: R,
        snapshots: S,
        cache: Arc<StatsCache>,
        config: &Config,
    ) -> Self {
        Self {
            metadata,
            source,
            assembler: StatsAssembler::new(snapshots, cache, config.image_fs_mountpoint.clone()),
            policy: config.batch_policy,
            timeout: config.collect_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<StatsCache> {
        self.assembler.cache()
    }

    /// Collects the stats of a single container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Container`] wrapping the cause if the container is
    /// unknown, its metrics cannot be fetched or decoded, or the collection
    /// exceeds the configured deadline.
    pub async fn collect(&self, container_id: &ContainerID) -> Result<ContainerStats> {
        let attributes = self
            .metadata
            .get(container_id)
            .map_err(|err| Error::from(err).for_container(container_id.clone()))?;
        self.collect_for(&attributes).await
    }

    /// Collects the stats of the containers with the given ids, in order.
    ///
    /// # Errors
    ///
    /// Under [`BatchPolicy::FailFast`] the first failing container aborts the
    /// batch and its error, identifying the container, is returned. Under
    /// [`BatchPolicy::Partial`] this never fails; failures end up in
    /// [`BatchReport::failures`].
    pub async fn list_container_stats(&self, container_ids: &[ContainerID]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for container_id in container_ids {
            let result = self.collect(container_id).await;
            self.record(&mut report, result)?;
        }
        Ok(report)
    }

    /// Collects the stats of every container known to the metadata store.
    ///
    /// # Errors
    ///
    /// Same as [`StatsLister::list_container_stats`].
    pub async fn list_all(&self) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for attributes in self.metadata.list() {
            let result = self.collect_for(&attributes).await;
            self.record(&mut report, result)?;
        }
        Ok(report)
    }

    /// Drops the cached CPU sample of a deleted container.
    pub fn forget(&self, container_id: &ContainerID) {
        if self.cache().remove(container_id).is_some() {
            log::debug!("forgot cpu sample: container_id={container_id}");
        }
    }

    fn record(&self, report: &mut BatchReport, result: Result<ContainerStats>) -> Result<()> {
        match result {
            Ok(stats) => report.stats.push(stats),
            Err(err) => match self.policy {
                BatchPolicy::FailFast => {
                    log::error!("Aborting stats listing: {err}");
                    return Err(err);
                }
                BatchPolicy::Partial => {
                    log::warn!("Skipping container in stats listing: {err}");
                    report.failures.push(err);
                }
            },
        }
        Ok(())
    }

    async fn collect_for(&self, attributes: &ContainerAttributes) -> Result<ContainerStats> {
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.fetch_and_assemble(attributes))
                .await
                .unwrap_or_else(|_| Err(Error::DeadlineExceeded { timeout })),
            None => self.fetch_and_assemble(attributes).await,
        };
        result.map_err(|err| err.for_container(attributes.id.clone()))
    }

    async fn fetch_and_assemble(&self, attributes: &ContainerAttributes) -> Result<ContainerStats> {
        let sample = self.source.fetch(&attributes.id).await?;
        self.assembler
            .collect_stats(attributes, sample.as_ref())
            .await
    }
}
