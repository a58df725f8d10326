use serde::Deserialize;
use std::path::Path;

use crate::models::{AveragingMode, RunConfig};

/// Default config path, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "bench.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampler: SamplerConfig,
    pub benchmark: BenchmarkConfig,
    pub files: FilesConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub poll_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Known server identifiers, in display and tie-break order.
    pub servers: Vec<String>,
    /// Echoed into each round summary's `config`.
    pub run: RunConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            servers: ["python", "go", "nodejs", "java", "rust"]
                .map(String::from)
                .to_vec(),
            run: RunConfig::default(),
        }
    }
}

/// File names inside a round directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub load_report: String,
    pub resource_stats: String,
    pub summary: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            load_report: "k6.json".into(),
            resource_stats: "stats.json".into(),
            summary: "summary.json".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub init_tool: String,
    /// CPU-bound tools averaged into the compute cost.
    pub compute_tools: Vec<String>,
    /// I/O-bound tools averaged into the I/O cost.
    pub io_tools: Vec<String>,
    /// Used for network throughput when the series carries no elapsed time.
    pub fallback_duration_secs: f64,
    pub averaging: AveragingMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            init_tool: "_initialize".into(),
            compute_tools: vec!["calculate_fibonacci".into(), "process_json_data".into()],
            io_tools: vec![
                "fetch_external_data".into(),
                "simulate_database_query".into(),
            ],
            fallback_duration_secs: 300.0,
            averaging: AveragingMode::ZeroFill,
        }
    }
}

impl AppConfig {
    /// Loads from `CONFIG_FILE`, or `bench.toml` if present, else defaults.
    /// An explicitly named file that cannot be read is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
                Self::load_from_str(&s)
            }
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                let s = std::fs::read_to_string(DEFAULT_CONFIG_PATH)?;
                Self::load_from_str(&s)
            }
            Err(_) => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sampler.poll_interval_ms > 0,
            "sampler.poll_interval_ms must be > 0, got {}",
            self.sampler.poll_interval_ms
        );
        anyhow::ensure!(
            !self.benchmark.servers.is_empty(),
            "benchmark.servers must list at least one server"
        );
        anyhow::ensure!(
            self.benchmark.servers.iter().all(|s| !s.is_empty()),
            "benchmark.servers must not contain empty names"
        );
        anyhow::ensure!(
            !self.files.load_report.is_empty(),
            "files.load_report must be non-empty"
        );
        anyhow::ensure!(
            !self.files.resource_stats.is_empty(),
            "files.resource_stats must be non-empty"
        );
        anyhow::ensure!(
            !self.files.summary.is_empty(),
            "files.summary must be non-empty"
        );
        anyhow::ensure!(
            !self.analysis.init_tool.is_empty(),
            "analysis.init_tool must be non-empty"
        );
        anyhow::ensure!(
            !self.analysis.compute_tools.is_empty(),
            "analysis.compute_tools must list at least one tool"
        );
        anyhow::ensure!(
            !self.analysis.io_tools.is_empty(),
            "analysis.io_tools must list at least one tool"
        );
        anyhow::ensure!(
            self.analysis.fallback_duration_secs > 0.0,
            "analysis.fallback_duration_secs must be > 0, got {}",
            self.analysis.fallback_duration_secs
        );
        Ok(())
    }
}
