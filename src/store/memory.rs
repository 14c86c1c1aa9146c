//! In-memory collaborator stores backed by [`DashMap`].
//!
//! Each store can be shared between the component that keeps it current (event
//! handlers, the snapshot syncer, the task service) and the stats path reading
//! from it, without external locking.

use std::future::ready;

use dashmap::DashMap;

use crate::container::{ContainerAttributes, ContainerID};
use crate::metrics::RawSample;

use super::{
    MetadataStore, MetricsSource, SnapshotError, SnapshotSizeProvider, SnapshotUsage, SourceError,
    StoreError,
};

/// Container metadata keyed by container id.
#[derive(Debug, Default)]
pub struct ContainerStore {
    containers: DashMap<ContainerID, ContainerAttributes>,
}

impl ContainerStore {
    /// Adds or replaces a container record.
    pub fn add(&self, attributes: ContainerAttributes) {
        self.containers.insert(attributes.id.clone(), attributes);
    }

    pub fn remove(&self, container_id: &ContainerID) -> Option<ContainerAttributes> {
        self.containers.remove(container_id).map(|(_, attrs)| attrs)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl MetadataStore for ContainerStore {
    fn get(&self, container_id: &ContainerID) -> Result<ContainerAttributes, StoreError> {
        self.containers
            .get(container_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(container_id.clone()))
    }

    fn list(&self) -> Vec<ContainerAttributes> {
        let mut out: Vec<ContainerAttributes> = self
            .containers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        // shard iteration order is arbitrary
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

/// Last computed writable-layer usage keyed by container id.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: DashMap<ContainerID, SnapshotUsage>,
}

impl SnapshotStore {
    pub fn update(&self, container_id: ContainerID, usage: SnapshotUsage) {
        self.snapshots.insert(container_id, usage);
    }

    pub fn remove(&self, container_id: &ContainerID) -> Option<SnapshotUsage> {
        self.snapshots.remove(container_id).map(|(_, usage)| usage)
    }
}

impl SnapshotSizeProvider for SnapshotStore {
    fn get(
        &self,
        container_id: &ContainerID,
    ) -> impl Future<Output = Result<SnapshotUsage, SnapshotError>> + Send {
        let usage = self
            .snapshots
            .get(container_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| SnapshotError::NotFound(container_id.clone()));
        ready(usage)
    }
}

/// Raw samples set ahead of time, keyed by container id.
///
/// Containers without a sample report no metrics, like a container whose task
/// is not running.
#[derive(Debug, Default)]
pub struct StaticMetricsSource {
    samples: DashMap<ContainerID, RawSample>,
}

impl StaticMetricsSource {
    pub fn set(&self, container_id: ContainerID, sample: RawSample) {
        self.samples.insert(container_id, sample);
    }

    pub fn clear(&self, container_id: &ContainerID) {
        self.samples.remove(container_id);
    }
}

impl MetricsSource for StaticMetricsSource {
    fn fetch(
        &self,
        container_id: &ContainerID,
    ) -> impl Future<Output = Result<Option<RawSample>, SourceError>> + Send {
        let sample = self
            .samples
            .get(container_id)
            .map(|entry| entry.value().clone());
        ready(Ok(sample))
    }
}
