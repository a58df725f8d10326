// Resource samples and the stats file written by the sampler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time observation of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    /// Resident usage minus page cache, in MiB.
    pub memory_mb: f64,
    pub memory_percent: f64,
    pub memory_limit_mb: f64,
    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
    /// Seconds since the sampler started. Older files do not carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_s: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

/// avg/max/min over a whole series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub cpu: Extremes,
    pub memory_mb: Extremes,
}

/// On-disk layout of `stats.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsFile {
    pub container: String,
    pub poll_interval_s: f64,
    pub sample_count: usize,
    pub samples: Vec<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ResourceSummary>,
}
