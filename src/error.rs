use std::time::Duration;

use crate::container::ContainerID;

/// Errors surfaced by a stats collection call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Metrics(#[from] crate::metrics::Error),
    #[error(transparent)]
    Metadata(#[from] crate::store::StoreError),
    #[error(transparent)]
    Source(#[from] crate::store::SourceError),
    #[error("collection exceeded the deadline of {timeout:?}")]
    DeadlineExceeded { timeout: Duration },
    #[error("failed to collect stats of container `{container_id}`: {source}")]
    Container {
        container_id: ContainerID,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with the id of the container it occurred for.
    pub fn for_container(self, container_id: ContainerID) -> Self {
        Error::Container {
            container_id,
            source: Box::new(self),
        }
    }

    /// The id of the offending container, if the error carries one.
    pub fn container_id(&self) -> Option<&ContainerID> {
        match self {
            Error::Container { container_id, .. } => Some(container_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    /// Converts to an `Option`, logging the error at `warn` level.
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }
}
