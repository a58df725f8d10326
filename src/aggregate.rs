// Cross-round analysis: mean and spread of headline metrics across repeated
// rounds, plus the compute vs I/O cost split from the raw load reports.
//
// Zero-fill mode divides by the round count even when a server is missing
// from some rounds, which deflates its means. Present-only divides by the
// rounds that actually reported the value.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{AnalysisConfig, AppConfig, FilesConfig};
use crate::documents::{self, DocumentError};
use crate::models::{
    AveragingMode, CostBreakdown, CrossRoundReport, LoadTestReport, MetricAggregate, OrderedMap,
    RoundSummary, Sample, ServerAggregate, ServerRoundRecord, StatsFile,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Shortest elapsed time used for throughput, in seconds.
const MIN_ELAPSED_SECS: f64 = 1.0;

/// `max(|v - mean|) / mean * 100`, or 0 when the mean is 0.
pub fn variance_percent(values: &[f64], mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    let max_diff = values
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0, f64::max);
    max_diff / mean * 100.0
}

/// Values that take part in the mean under `mode`.
fn effective_values(values: &[Option<f64>], mode: AveragingMode) -> Vec<f64> {
    match mode {
        AveragingMode::ZeroFill => values.iter().map(|v| v.unwrap_or(0.0)).collect(),
        AveragingMode::PresentOnly => values.iter().flatten().copied().collect(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean over rounds; `values` holds one entry per round.
pub fn mean_over_rounds(values: &[Option<f64>], mode: AveragingMode) -> f64 {
    mean(&effective_values(values, mode))
}

pub fn aggregate_metric(values: &[Option<f64>], mode: AveragingMode) -> MetricAggregate {
    let effective = effective_values(values, mode);
    let mean = mean(&effective);
    MetricAggregate {
        values: values.to_vec(),
        mean,
        variance_percent: variance_percent(&effective, mean),
    }
}

/// Loads `<dir>/<files.summary>` for every round. Any failure is fatal.
pub fn load_round_summaries(
    round_dirs: &[PathBuf],
    files: &FilesConfig,
) -> anyhow::Result<Vec<RoundSummary>> {
    round_dirs
        .iter()
        .map(|dir| {
            let path = dir.join(&files.summary);
            documents::load_json::<RoundSummary>(&path)
                .with_context(|| format!("loading round summary for {}", dir.display()))
        })
        .collect()
}

fn server_metric(
    summaries: &[RoundSummary],
    server: &str,
    key: fn(&ServerRoundRecord) -> Option<f64>,
) -> Vec<Option<f64>> {
    summaries
        .iter()
        .map(|s| s.servers.get(server).and_then(key))
        .collect()
}

/// Per-server mean and variance of RPS, average latency and average memory.
pub fn aggregate_rounds(
    summaries: &[RoundSummary],
    servers: &[String],
    mode: AveragingMode,
) -> OrderedMap<ServerAggregate> {
    for (round, summary) in summaries.iter().enumerate() {
        let missing: Vec<&str> = servers
            .iter()
            .map(String::as_str)
            .filter(|s| !summary.servers.contains_key(s))
            .collect();
        if !missing.is_empty() {
            warn!(
                round = round + 1,
                missing = ?missing,
                available = ?summary.servers.keys().collect::<Vec<_>>(),
                "round summary is missing servers"
            );
        }
    }

    servers
        .iter()
        .map(|server| {
            let agg = ServerAggregate {
                rps: aggregate_metric(&server_metric(summaries, server, |r| r.http.rps), mode),
                latency_avg: aggregate_metric(
                    &server_metric(summaries, server, |r| r.http.latency_avg()),
                    mode,
                ),
                memory_mb_avg: aggregate_metric(
                    &server_metric(summaries, server, |r| r.memory_avg()),
                    mode,
                ),
            };
            (server.clone(), agg)
        })
        .collect()
}

/// Throughput in MB/s between the first and last sample. Elapsed time comes
/// from the last sample, else `fallback_secs`, floored at one second.
/// Counters are taken as monotonic; a restart mid-run is not detected.
pub fn network_throughput_mb_per_s(samples: &[Sample], fallback_secs: f64) -> f64 {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return 0.0;
    };
    let rx = last.net_rx_bytes as f64 - first.net_rx_bytes as f64;
    let tx = last.net_tx_bytes as f64 - first.net_tx_bytes as f64;
    let elapsed = last
        .elapsed_s
        .unwrap_or(fallback_secs)
        .max(MIN_ELAPSED_SECS);
    (rx + tx) / BYTES_PER_MB / elapsed
}

/// k6-derived costs of one server in one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportCosts {
    pub init_ms: f64,
    pub max_latency_ms: f64,
    pub compute_ms: f64,
    pub io_ms: f64,
}

fn tools_mean(report: &LoadTestReport, tools: &[String]) -> Result<f64, String> {
    let avgs = tools
        .iter()
        .map(|t| report.tool_avg(t).ok_or_else(|| format!("tools.{t}.avg")))
        .collect::<Result<Vec<f64>, String>>()?;
    Ok(mean(&avgs))
}

/// All four costs, or the first missing field. A report lacking any of them
/// contributes none of them.
pub fn report_costs(
    report: &LoadTestReport,
    analysis: &AnalysisConfig,
) -> Result<ReportCosts, String> {
    let init_ms = report
        .tool_avg(&analysis.init_tool)
        .ok_or_else(|| format!("tools.{}.avg", analysis.init_tool))?;
    let max_latency_ms = report
        .http
        .latency_max()
        .ok_or_else(|| "http.latency.max".to_string())?;
    Ok(ReportCosts {
        init_ms,
        max_latency_ms,
        compute_ms: tools_mean(report, &analysis.compute_tools)?,
        io_ms: tools_mean(report, &analysis.io_tools)?,
    })
}

fn load_round_input<T: serde::de::DeserializeOwned>(
    path: &Path,
    round: usize,
    server: &str,
) -> Option<T> {
    match documents::load_json::<T>(path) {
        Ok(v) => Some(v),
        Err(e) => {
            let missing = matches!(e, DocumentError::Missing { .. });
            warn!(round, server, missing, error = %e, "round input unavailable; counted as zero");
            None
        }
    }
}

/// Per-server means of init time, max latency, compute/I-O cost and network
/// throughput, read from the raw files of every round.
pub fn cost_breakdown(
    round_dirs: &[PathBuf],
    servers: &[String],
    files: &FilesConfig,
    analysis: &AnalysisConfig,
    mode: AveragingMode,
) -> OrderedMap<CostBreakdown> {
    servers
        .iter()
        .map(|server| {
            let mut costs: Vec<Option<ReportCosts>> = Vec::with_capacity(round_dirs.len());
            let mut net: Vec<Option<f64>> = Vec::with_capacity(round_dirs.len());

            for (i, dir) in round_dirs.iter().enumerate() {
                let round = i + 1;
                let server_dir = dir.join(server);

                let report = load_round_input::<LoadTestReport>(
                    &server_dir.join(&files.load_report),
                    round,
                    server,
                );
                costs.push(report.and_then(|r| match report_costs(&r, analysis) {
                    Ok(c) => Some(c),
                    Err(field) => {
                        warn!(round, server = %server, field = %field, "load report incomplete; counted as zero");
                        None
                    }
                }));

                let stats = load_round_input::<StatsFile>(
                    &server_dir.join(&files.resource_stats),
                    round,
                    server,
                );
                net.push(stats.filter(|s| !s.samples.is_empty()).map(|s| {
                    network_throughput_mb_per_s(&s.samples, analysis.fallback_duration_secs)
                }));
            }

            let pick = |f: fn(&ReportCosts) -> f64| -> Vec<Option<f64>> {
                costs.iter().map(|c| c.as_ref().map(f)).collect()
            };
            let breakdown = CostBreakdown {
                init_ms: mean_over_rounds(&pick(|c| c.init_ms), mode),
                net_mb_per_s: mean_over_rounds(&net, mode),
                max_latency_ms: mean_over_rounds(&pick(|c| c.max_latency_ms), mode),
                compute_ms: mean_over_rounds(&pick(|c| c.compute_ms), mode),
                io_ms: mean_over_rounds(&pick(|c| c.io_ms), mode),
            };
            (server.clone(), breakdown)
        })
        .collect()
}

/// Full cross-round analysis over `round_dirs`, in the given order.
pub fn analyze(
    round_dirs: &[PathBuf],
    config: &AppConfig,
    mode: AveragingMode,
) -> anyhow::Result<CrossRoundReport> {
    anyhow::ensure!(!round_dirs.is_empty(), "at least one round directory is required");
    let summaries = load_round_summaries(round_dirs, &config.files)?;
    let servers = &config.benchmark.servers;

    let report = CrossRoundReport {
        rounds: round_dirs.iter().map(|d| d.display().to_string()).collect(),
        mode,
        servers: aggregate_rounds(&summaries, servers, mode),
        costs: cost_breakdown(round_dirs, servers, &config.files, &config.analysis, mode),
    };
    info!(rounds = round_dirs.len(), servers = servers.len(), ?mode, "cross-round analysis done");
    Ok(report)
}

/// Server | Metric | Round 1..N | Var % table.
pub fn render_variance_table(report: &CrossRoundReport) -> String {
    VarianceTable(report).to_string()
}

/// Init / network / max latency / compute / I-O means per server.
pub fn render_cost_table(report: &CrossRoundReport) -> String {
    CostTable(report).to_string()
}

struct VarianceTable<'a>(&'a CrossRoundReport);

impl fmt::Display for VarianceTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = format!("{:<10} | {:<12}", "Server", "Metric");
        for i in 1..=self.0.rounds.len() {
            header.push_str(&format!(" | {:<10}", format!("Round {i}")));
        }
        header.push_str(&format!(" | {:<6}", "Var %"));
        let rule = "-".repeat(header.chars().count());
        writeln!(f, "{header}\n{rule}")?;

        for (server, agg) in self.0.servers.iter() {
            for (label, metric) in [
                ("RPS", &agg.rps),
                ("Lat Avg", &agg.latency_avg),
                ("Mem MB", &agg.memory_mb_avg),
            ] {
                write!(f, "{:<10} | {:<12}", server, label)?;
                for v in &metric.values {
                    write!(f, " | {:<10.1}", v.unwrap_or(0.0))?;
                }
                writeln!(f, " | {:<6.1}%", metric.variance_percent)?;
            }
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

struct CostTable<'a>(&'a CrossRoundReport);

impl fmt::Display for CostTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} | {:<10} | {:<10} | {:<10} | {:<10} | {:<10}",
            "Server", "Init (ms)", "Net (MB/s)", "Max Lat", "Comp (ms)", "I/O (ms)"
        )?;
        writeln!(f, "{}", "-".repeat(80))?;
        for (server, c) in self.0.costs.iter() {
            writeln!(
                f,
                "{:<10} | {:<10.2} | {:<10.2} | {:<10.0} | {:<10.2} | {:<10.2}",
                server, c.init_ms, c.net_mb_per_s, c.max_latency_ms, c.compute_ms, c.io_ms
            )?;
        }
        Ok(())
    }
}
