//! Runtime configuration read from environment variables.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `CRI_STATS_IMAGE_FS_PATH` | mountpoint reported as the writable layer's filesystem | [`DEFAULT_IMAGE_FS_PATH`] |
//! | `CRI_STATS_COLLECT_TIMEOUT_MS` | deadline of one container's collection, in milliseconds | none |
//! | `CRI_STATS_BATCH_POLICY` | `fail-fast` or `partial` | `fail-fast` |

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_IMAGE_FS_PATH: &str = "/var/lib/containerd/io.containerd.snapshotter.v1.overlayfs";

const IMAGE_FS_PATH_VAR: &str = "CRI_STATS_IMAGE_FS_PATH";
const COLLECT_TIMEOUT_VAR: &str = "CRI_STATS_COLLECT_TIMEOUT_MS";
const BATCH_POLICY_VAR: &str = "CRI_STATS_BATCH_POLICY";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for `{var}`: {value:?}: {source}")]
    InvalidTimeout {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{0}` must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("invalid batch policy {0:?}, expected `fail-fast` or `partial`")]
    InvalidBatchPolicy(String),
}

/// What a batch listing does when one container fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// The first failing container aborts the whole batch.
    #[default]
    FailFast,
    /// Failing containers are reported next to the stats of the others.
    Partial,
}

impl FromStr for BatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(BatchPolicy::FailFast),
            "partial" => Ok(BatchPolicy::Partial),
            other => Err(Error::InvalidBatchPolicy(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Mountpoint reported as the filesystem of every writable layer.
    pub image_fs_mountpoint: String,
    /// Deadline of one container's collection. `None` waits indefinitely.
    pub collect_timeout: Option<Duration>,
    pub batch_policy: BatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_fs_mountpoint: DEFAULT_IMAGE_FS_PATH.to_owned(),
            collect_timeout: None,
            batch_policy: BatchPolicy::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value. Unset
    /// variables take their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Config::default();

        if let Some(path) = lookup(IMAGE_FS_PATH_VAR).filter(|p| !p.is_empty()) {
            config.image_fs_mountpoint = path;
        }

        if let Some(value) = lookup(COLLECT_TIMEOUT_VAR) {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|source| Error::InvalidTimeout {
                    var: COLLECT_TIMEOUT_VAR,
                    value: value.clone(),
                    source,
                })?;
            if millis == 0 {
                return Err(Error::ZeroTimeout(COLLECT_TIMEOUT_VAR));
            }
            config.collect_timeout = Some(Duration::from_millis(millis));
        }

        if let Some(value) = lookup(BATCH_POLICY_VAR) {
            config.batch_policy = value.trim().parse()?;
        }

        log::debug!("Config: {:?}", config);
        Ok(config)
    }
}
