// Round summary (summary.json) written by the consolidator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HttpMetrics, OrderedMap, ResourceSummary, ToolMetric};

/// Run parameters echoed into every round summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub vus: u32,
    pub duration: String,
    pub cpu_limit: String,
    pub memory_limit: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            vus: 10,
            duration: "5m".into(),
            cpu_limit: "1.0".into(),
            memory_limit: "1G".into(),
        }
    }
}

/// One server's result for one round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerRoundRecord {
    #[serde(default)]
    pub http: HttpMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<Value>,
    #[serde(default)]
    pub tools: OrderedMap<ToolMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSummary>,
}

impl ServerRoundRecord {
    pub fn cpu_avg(&self) -> Option<f64> {
        self.resources.map(|r| r.cpu.avg)
    }

    pub fn memory_avg(&self) -> Option<f64> {
        self.resources.map(|r| r.memory_mb.avg)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results_dir: String,
    #[serde(default)]
    pub config: RunConfig,
    #[serde(default, alias = "results")]
    pub servers: OrderedMap<ServerRoundRecord>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub rankings: OrderedMap<Vec<String>>,
}
