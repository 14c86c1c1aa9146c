use crate::container::ContainerID;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("container `{0}` not found")]
    NotFound(ContainerID),
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("no snapshot usage recorded for container `{0}`")]
    NotFound(ContainerID),
    #[error("failed to look up snapshot usage of container `{container_id}`: {source}")]
    Backend {
        container_id: ContainerID,
        #[source]
        source: BoxError,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("failed to fetch metrics of container `{container_id}`: {source}")]
pub struct SourceError {
    pub container_id: ContainerID,
    #[source]
    pub source: BoxError,
}
