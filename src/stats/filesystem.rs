//! Writable-layer usage lookup.
//!
//! The writable layer is accounted by the snapshotter, not by cgroups, so its
//! usage comes from a [`SnapshotSizeProvider`]. A container whose layer has not
//! been measured yet reports zeros. Lookup failures are swallowed as well:
//! filesystem accounting never keeps CPU and memory stats from being reported.

use crate::container::ContainerID;
use crate::error::ResultOkLogExt;
use crate::store::{SnapshotError, SnapshotSizeProvider};

/// Used bytes and inodes of a container's writable layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WritableLayerUsage {
    pub used_bytes: u64,
    pub inodes_used: u64,
    /// When the provider computed the usage; `None` if it had no record.
    pub timestamp: Option<i64>,
}

#[derive(Debug)]
pub struct FilesystemUsageResolver<S> {
    provider: S,
}

impl<S> FilesystemUsageResolver<S>
where
    S: SnapshotSizeProvider,
{
    pub fn new(provider: S) -> Self {
        Self { provider }
    }

    /// Looks up the writable-layer usage of `container_id`.
    ///
    /// Never fails: a missing record or a provider error both yield zeros.
    pub async fn resolve(&self, container_id: &ContainerID) -> WritableLayerUsage {
        let usage = match self.provider.get(container_id).await {
            Err(SnapshotError::NotFound(_)) => {
                log::debug!("no writable layer usage recorded yet: container_id={container_id}");
                None
            }
            result => result.ok_log(),
        };

        usage
            .map(|usage| WritableLayerUsage {
                used_bytes: usage.used_bytes,
                inodes_used: usage.inodes_used,
                timestamp: Some(usage.timestamp),
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotUsage;
    use crate::store::memory::SnapshotStore;

    struct BrokenProvider;

    impl SnapshotSizeProvider for BrokenProvider {
        fn get(
            &self,
            container_id: &ContainerID,
        ) -> impl Future<Output = Result<SnapshotUsage, SnapshotError>> + Send {
            let err = SnapshotError::Backend {
                container_id: container_id.clone(),
                source: "snapshotter unavailable".into(),
            };
            std::future::ready(Err(err))
        }
    }

    fn id(raw: &str) -> ContainerID {
        ContainerID::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_recorded_usage() {
        let store = SnapshotStore::default();
        store.update(
            id("c1"),
            SnapshotUsage {
                used_bytes: 1 << 20,
                inodes_used: 42,
                timestamp: 1_000,
            },
        );
        let resolver = FilesystemUsageResolver::new(store);

        let usage = resolver.resolve(&id("c1")).await;
        assert_eq!(
            usage,
            WritableLayerUsage {
                used_bytes: 1 << 20,
                inodes_used: 42,
                timestamp: Some(1_000),
            }
        );
        // no update in between, same answer
        assert_eq!(resolver.resolve(&id("c1")).await, usage);
    }

    #[tokio::test]
    async fn test_resolve_miss_is_zero() {
        let resolver = FilesystemUsageResolver::new(SnapshotStore::default());

        let usage = resolver.resolve(&id("c2")).await;
        assert_eq!(usage, WritableLayerUsage::default());
        assert_eq!(usage.used_bytes, 0);
        assert_eq!(usage.inodes_used, 0);
    }

    #[tokio::test]
    async fn test_resolve_fails_open() {
        let _ = env_logger::builder().is_test(true).try_init();
        let resolver = FilesystemUsageResolver::new(BrokenProvider);

        assert_eq!(
            resolver.resolve(&id("c3")).await,
            WritableLayerUsage::default()
        );
    }
}
