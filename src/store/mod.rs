//! Interfaces of the collaborators the engine reads from.
//!
//! None of these are implemented against a real runtime here. The traits
//! describe what the stats path consumes; [`memory`] provides in-process
//! implementations, the way the runtime keeps its own container and snapshot
//! caches in memory.

mod error;
pub mod memory;

pub use error::{SnapshotError, SourceError, StoreError};

use crate::container::{ContainerAttributes, ContainerID};
use crate::metrics::RawSample;

/// Size of a container's writable layer, as last computed by the snapshotter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotUsage {
    pub used_bytes: u64,
    pub inodes_used: u64,
    /// When the usage was computed, in nanoseconds since the epoch.
    pub timestamp: i64,
}

/// Keyed lookup of container configuration.
pub trait MetadataStore {
    /// Returns the attributes of the container with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such container is known.
    fn get(&self, container_id: &ContainerID) -> Result<ContainerAttributes, StoreError>;

    /// Returns the attributes of all known containers.
    fn list(&self) -> Vec<ContainerAttributes>;
}

/// Lookup of writable-layer usage per container.
pub trait SnapshotSizeProvider {
    fn get(
        &self,
        container_id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<SnapshotUsage, SnapshotError>> + Send;
}

/// Source of raw cgroup metrics per container.
pub trait MetricsSource {
    /// Fetches the current raw sample of a container.
    ///
    /// `Ok(None)` means the container has no running task to report metrics for.
    fn fetch(
        &self,
        container_id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<Option<RawSample>, SourceError>> + Send;
}

impl<T: MetadataStore + ?Sized> MetadataStore for std::sync::Arc<T> {
    fn get(&self, container_id: &ContainerID) -> Result<ContainerAttributes, StoreError> {
        (**self).get(container_id)
    }

    fn list(&self) -> Vec<ContainerAttributes> {
        (**self).list()
    }
}

impl<T: SnapshotSizeProvider> SnapshotSizeProvider for std::sync::Arc<T> {
    fn get(
        &self,
        container_id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<SnapshotUsage, SnapshotError>> + Send {
        (**self).get(container_id)
    }
}

impl<T: MetricsSource> MetricsSource for std::sync::Arc<T> {
    fn fetch(
        &self,
        container_id: &ContainerID,
    ) -> impl std::future::Future<Output = Result<Option<RawSample>, SourceError>> + Send {
        (**self).fetch(container_id)
    }
}
