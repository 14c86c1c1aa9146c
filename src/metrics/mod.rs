//! Raw cgroup metric payloads as reported by the runtime shim.
//!
//! A shim reports metrics as a self-describing protobuf [`Any`]: the `type_url`
//! names the message and `value` carries its encoding. Two payload shapes exist,
//! one per cgroup hierarchy version, and they share almost no field layout:
//!
//! - [`v1::Metrics`]: per-controller hierarchy, CPU time in nanoseconds,
//!   memory usage wrapped in a [`v1::MemoryEntry`].
//! - [`v2::Metrics`]: unified hierarchy, CPU time in microseconds, flat memory
//!   counters.
//!
//! [`RawMetrics`] is the closed union over both. Anything else is rejected with
//! [`Error::UnsupportedMetricEncoding`].
//!
//! # Example
//!
//! ```rust
//! use cri_stats::metrics::{RawMetrics, v2};
//!
//! let raw = RawMetrics::V2(v2::Metrics {
//!     cpu: Some(v2::CpuStat { usage_usec: 1_000, ..Default::default() }),
//!     ..Default::default()
//! });
//! let any = raw.to_any();
//! assert_eq!(RawMetrics::decode(&any).unwrap(), raw);
//! ```

mod error;
pub mod v1;
pub mod v2;

pub use error::{Error, Result};

use prost::Message;
use prost_types::{Any, Timestamp};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Decoded cgroup metrics of one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMetrics {
    V1(v1::Metrics),
    V2(v2::Metrics),
}

impl RawMetrics {
    /// Decodes the payload of `any` according to its `type_url`.
    ///
    /// Only the last `/`-separated segment of the type url is compared, so both
    /// bare names and `types.containerd.io/...` prefixed urls are accepted.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedMetricEncoding`] if the type url names neither payload.
    /// - [`Error::Decode`] if the payload does not decode as the named message.
    pub fn decode(any: &Any) -> Result<Self> {
        let type_name = any.type_url.rsplit('/').next().unwrap_or_default();
        let decode_error = |source| Error::Decode {
            type_url: any.type_url.clone(),
            source,
        };
        match type_name {
            v1::TYPE_NAME => v1::Metrics::decode(any.value.as_slice())
                .map(RawMetrics::V1)
                .map_err(decode_error),
            v2::TYPE_NAME => v2::Metrics::decode(any.value.as_slice())
                .map(RawMetrics::V2)
                .map_err(decode_error),
            _ => Err(Error::UnsupportedMetricEncoding {
                type_url: any.type_url.clone(),
            }),
        }
    }

    /// Encodes the metrics into an [`Any`] named by the bare type name.
    pub fn to_any(&self) -> Any {
        match self {
            RawMetrics::V1(metrics) => Any {
                type_url: v1::TYPE_NAME.to_owned(),
                value: metrics.encode_to_vec(),
            },
            RawMetrics::V2(metrics) => Any {
                type_url: v2::TYPE_NAME.to_owned(),
                value: metrics.encode_to_vec(),
            },
        }
    }
}

/// One undecoded metrics sample of a container, as fetched from the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Time at which the shim read the cgroup files.
    pub timestamp: Timestamp,
    pub data: Any,
}

impl RawSample {
    pub fn new(timestamp: Timestamp, data: Any) -> Self {
        Self { timestamp, data }
    }

    /// Builds a sample from decoded metrics and a timestamp in nanoseconds since the epoch.
    pub fn from_metrics(metrics: &RawMetrics, timestamp_nanos: i64) -> Self {
        Self {
            timestamp: timestamp_from_nanos(timestamp_nanos),
            data: metrics.to_any(),
        }
    }

    /// Sample time in nanoseconds since the epoch.
    pub fn timestamp_nanos(&self) -> i64 {
        timestamp_to_nanos(&self.timestamp)
    }
}

/// Converts a protobuf timestamp to nanoseconds since the epoch, saturating at the `i64` bounds.
pub fn timestamp_to_nanos(ts: &Timestamp) -> i64 {
    ts.seconds
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(i64::from(ts.nanos))
}

pub fn timestamp_from_nanos(nanos: i64) -> Timestamp {
    Timestamp {
        seconds: nanos.div_euclid(NANOS_PER_SECOND),
        // always in 0..1e9, fits an i32
        nanos: nanos.rem_euclid(NANOS_PER_SECOND) as i32,
    }
}
