// Load generator report (k6.json). External schema; only the fields the
// pipeline reads are typed, everything else is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::OrderedMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregate HTTP request metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyStats>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HttpMetrics {
    pub fn latency_avg(&self) -> Option<f64> {
        self.latency.as_ref().and_then(|l| l.avg)
    }

    pub fn latency_p95(&self) -> Option<f64> {
        self.latency.as_ref().and_then(|l| l.p95)
    }

    pub fn latency_max(&self) -> Option<f64> {
        self.latency.as_ref().and_then(|l| l.max)
    }
}

/// Per-tool latency record. Tools with no calls report a null `avg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetric {
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p50: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadTestReport {
    #[serde(default)]
    pub http: HttpMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<Value>,
    #[serde(default)]
    pub tools: OrderedMap<ToolMetric>,
}

impl LoadTestReport {
    /// `None` when the tool is absent or has no numeric average.
    pub fn tool_avg(&self, name: &str) -> Option<f64> {
        self.tools.get(name).and_then(|t| t.avg)
    }
}
