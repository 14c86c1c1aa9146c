/// CRI Stats: normalizes raw containerd cgroup metrics into CRI container stats.
///
/// This library decodes cgroup v1 and v2 metric payloads, derives CPU, memory,
/// process and writable-layer records from them, and computes the CPU usage
/// rate by remembering the previous sample of every container.
pub mod assembler;
pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod lister;
pub mod metrics;
pub mod stats;
pub mod store;

pub use assembler::StatsAssembler;
pub use cache::StatsCache;
pub use config::{BatchPolicy, Config};
pub use error::{Error, Result};
pub use lister::{BatchReport, StatsLister};
