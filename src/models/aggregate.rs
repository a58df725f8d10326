// Cross-round aggregates: one value per round plus mean and spread.

use serde::{Deserialize, Serialize};

use super::OrderedMap;

/// How a metric missing from some rounds is averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AveragingMode {
    /// Missing rounds count as 0.0 and the divisor is always the round count.
    #[default]
    ZeroFill,
    /// Only rounds that reported the metric are averaged.
    PresentOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    /// Per-round values in round order; `None` where the round had no data.
    pub values: Vec<Option<f64>>,
    pub mean: f64,
    pub variance_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerAggregate {
    pub rps: MetricAggregate,
    pub latency_avg: MetricAggregate,
    pub memory_mb_avg: MetricAggregate,
}

/// Per-server means of the cost decomposition metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub init_ms: f64,
    pub net_mb_per_s: f64,
    pub max_latency_ms: f64,
    pub compute_ms: f64,
    pub io_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRoundReport {
    pub rounds: Vec<String>,
    pub mode: AveragingMode,
    pub servers: OrderedMap<ServerAggregate>,
    pub costs: OrderedMap<CostBreakdown>,
}
