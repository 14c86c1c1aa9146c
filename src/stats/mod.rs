//! Normalized, version-independent container statistics.
//!
//! Every record here is what the orchestration API sees, regardless of whether
//! the raw payload came from a cgroup v1 or a cgroup v2 hierarchy.
//!
//! # Main types
//!
//! - [`ContainerStats`]: the aggregate returned per container. Sub-records that
//!   the raw payload did not carry are `None` and omitted from the serialized
//!   form; the writable layer is always present.
//! - [`CpuStats`], [`MemoryStats`], [`ProcessStats`], [`FileSystemStats`]:
//!   the per-resource records, each with its own nanosecond timestamp.
//! - [`UInt64Value`]: the explicit value wrapper of the wire schema. Optional
//!   numeric fields are `Option<UInt64Value>`, which is independent of whether a
//!   whole sub-record was extracted.
//!
//! # Extraction
//!
//! [`extract_cpu`], [`extract_memory`] and [`extract_process`] turn a decoded
//! [`RawMetrics`](crate::metrics::RawMetrics) into records. They return `None`
//! when the payload lacks the relevant sub-structure; that is never an error.

pub mod cpu;
pub mod filesystem;
pub mod memory;
pub mod process;

pub use cpu::extract_cpu;
pub use filesystem::{FilesystemUsageResolver, WritableLayerUsage};
pub use memory::extract_memory;
pub use process::extract_process;

use crate::container::ContainerAttributes;

/// An unsigned value that is explicitly present on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize)]
pub struct UInt64Value {
    pub value: u64,
}

impl From<u64> for UInt64Value {
    fn from(value: u64) -> Self {
        Self { value }
    }
}

/// CPU usage of a container.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CpuStats {
    /// Nanoseconds since the epoch.
    pub timestamp: i64,
    /// Cumulative CPU usage (sum across all cores) since container creation.
    pub usage_core_nano_seconds: UInt64Value,
    /// CPU usage (sum of all cores) averaged over the interval since the previous sample.
    ///
    /// Absent on the first sample of a container and right after a counter reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_nano_cores: Option<UInt64Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfs_throttled_periods_total: Option<UInt64Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfs_throttled_seconds_total: Option<UInt64Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_seconds_total: Option<UInt64Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_seconds_total: Option<UInt64Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_seconds_total: Option<UInt64Value>,
}

/// Memory usage of a container.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryStats {
    /// Nanoseconds since the epoch.
    pub timestamp: i64,
    /// Usage minus inactive file-backed pages, never below zero.
    pub working_set_bytes: UInt64Value,
    /// Limit minus working set; zero when the container has no effective limit.
    pub available_bytes: UInt64Value,
    /// Total memory in use, regardless of when it was accessed.
    pub usage_bytes: UInt64Value,
    /// Anonymous and swap cache memory.
    pub rss_bytes: UInt64Value,
    pub page_faults: UInt64Value,
    pub major_page_faults: UInt64Value,
    pub cache_bytes: UInt64Value,
    /// cgroup v1 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_count: Option<UInt64Value>,
    /// cgroup v1 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_bytes: Option<UInt64Value>,
}

/// Process (task) usage of a container.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProcessStats {
    pub timestamp: i64,
    /// Maximum number of tasks; zero means unlimited.
    pub threads_max: UInt64Value,
    pub threads_count: UInt64Value,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FilesystemIdentifier {
    pub mountpoint: String,
}

/// Usage of the container's writable layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileSystemStats {
    pub timestamp: i64,
    pub fs_id: FilesystemIdentifier,
    pub used_bytes: UInt64Value,
    pub inodes_used: UInt64Value,
}

/// All statistics of one container from one collection pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerStats {
    pub attributes: ContainerAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    pub writable_layer: FileSystemStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessStats>,
}

impl ContainerStats {
    pub fn container_id(&self) -> &crate::container::ContainerID {
        &self.attributes.id
    }
}
