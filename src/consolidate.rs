// Round consolidation: merge each server's load report and resource summary
// into one round summary with rankings.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::config::FilesConfig;
use crate::documents::{self, load_optional};
use crate::models::{
    LoadTestReport, OrderedMap, RoundSummary, RunConfig, ServerRoundRecord, StatsFile,
};
use crate::ranking;

/// Builds the record for one server. `None` when the load report is missing
/// or unparseable: a server never appears without one.
pub fn load_server_record(
    server_dir: &Path,
    server: &str,
    files: &FilesConfig,
) -> Option<ServerRoundRecord> {
    let report_path = server_dir.join(&files.load_report);
    let Some(report) = load_optional::<LoadTestReport>(&report_path, server) else {
        debug!(server, "server left out of round");
        return None;
    };

    let stats_path = server_dir.join(&files.resource_stats);
    let resources = load_optional::<StatsFile>(&stats_path, server).and_then(|s| s.summary);

    Some(ServerRoundRecord {
        http: report.http,
        mcp: report.mcp,
        tools: report.tools,
        resources,
    })
}

/// Consolidates one round directory (`<results_dir>/<server>/...`).
#[instrument(skip_all, fields(results_dir = %results_dir.display()))]
pub fn consolidate(
    results_dir: &Path,
    servers: &[String],
    run_config: &RunConfig,
    files: &FilesConfig,
) -> RoundSummary {
    let mut records = OrderedMap::new();
    for server in servers {
        if let Some(record) = load_server_record(&results_dir.join(server), server, files) {
            records.insert(server.clone(), record);
        }
    }

    let rankings = ranking::rank_all(&records);
    info!(
        servers = records.len(),
        rankings = rankings.len(),
        "round consolidated"
    );

    RoundSummary {
        timestamp: Some(Utc::now()),
        results_dir: results_dir.display().to_string(),
        config: run_config.clone(),
        servers: records,
        rankings,
    }
}

/// Consolidates and writes `<results_dir>/<files.summary>`.
pub fn consolidate_and_write(
    results_dir: &Path,
    servers: &[String],
    run_config: &RunConfig,
    files: &FilesConfig,
) -> anyhow::Result<RoundSummary> {
    let summary = consolidate(results_dir, servers, run_config, files);
    let out = results_dir.join(&files.summary);
    documents::write_json(&out, &summary)?;
    info!(path = %out.display(), "summary saved");
    Ok(summary)
}

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Fixed-width table of one round plus the top three of each ranking.
pub fn render_round_table(summary: &RoundSummary) -> String {
    if summary.servers.is_empty() {
        return "No results to display.\n".to_string();
    }
    RoundTable(summary).to_string()
}

struct RoundTable<'a>(&'a RoundSummary);

impl fmt::Display for RoundTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let rule = "=".repeat(75);
        writeln!(f, "\n{rule}\n  BENCHMARK SUMMARY\n{rule}")?;
        writeln!(
            f,
            "\n  {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>7} {:>8}",
            "Server", "RPS", "Avg(ms)", "P50(ms)", "P95(ms)", "P99(ms)", "CPU%", "MEM(MB)"
        )?;
        writeln!(f, "  {}", "-".repeat(67))?;

        for (name, data) in summary.servers.iter() {
            let lat = data.http.latency.clone().unwrap_or_default();
            writeln!(
                f,
                "  {:<10} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>7.1} {:>8.1}",
                name,
                data.http.rps.unwrap_or(0.0),
                lat.avg.unwrap_or(0.0),
                lat.p50.unwrap_or(0.0),
                lat.p95.unwrap_or(0.0),
                lat.p99.unwrap_or(0.0),
                data.cpu_avg().unwrap_or(0.0),
                data.memory_avg().unwrap_or(0.0),
            )?;
        }

        if !summary.rankings.is_empty() {
            writeln!(f, "\n  Rankings\n  {}", "-".repeat(40))?;
            for (key, order) in summary.rankings.iter() {
                let label = ranking::dimension(key).map_or(key, |d| d.label);
                let podium: Vec<String> = order
                    .iter()
                    .zip(MEDALS)
                    .map(|(server, medal)| format!("{medal} {server}"))
                    .collect();
                writeln!(f, "  {:<25} {}", label, podium.join("  "))?;
            }
        }

        writeln!(f, "\n{rule}")
    }
}
