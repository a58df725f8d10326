// Domain models: stats files, load reports, round summaries, cross-round aggregates

mod aggregate;
mod ordered;
mod report;
mod sample;
mod summary;

pub use aggregate::{AveragingMode, CostBreakdown, CrossRoundReport, MetricAggregate, ServerAggregate};
pub use ordered::OrderedMap;
pub use report::{HttpMetrics, LatencyStats, LoadTestReport, ToolMetric};
pub use sample::{Extremes, ResourceSummary, Sample, StatsFile};
pub use summary::{RoundSummary, RunConfig, ServerRoundRecord};
