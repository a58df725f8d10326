// Shared test helpers: samples and on-disk round fixtures

#![allow(dead_code)]

use benchmetrics::models::*;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::path::Path;

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-10T18:22:44Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn sample(offset_secs: i64, cpu_percent: f64, memory_mb: f64) -> Sample {
    Sample {
        timestamp: base_time() + Duration::seconds(offset_secs),
        cpu_percent,
        memory_mb,
        memory_percent: 0.0,
        memory_limit_mb: 0.0,
        net_rx_bytes: 0,
        net_tx_bytes: 0,
        elapsed_s: None,
    }
}

pub fn net_sample(elapsed_s: Option<f64>, rx: u64, tx: u64) -> Sample {
    Sample {
        net_rx_bytes: rx,
        net_tx_bytes: tx,
        elapsed_s,
        ..sample(0, 0.0, 0.0)
    }
}

fn write(path: &Path, value: &serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// `<round>/<server>/k6.json` with the given headline numbers and the four
/// cost tools plus `_initialize`.
pub fn write_report(round: &Path, server: &str, rps: f64, latency_avg: f64, latency_p95: f64) {
    write(
        &round.join(server).join("k6.json"),
        &json!({
            "http": {
                "rps": rps,
                "requests": 1000,
                "latency": { "avg": latency_avg, "p50": latency_avg, "p95": latency_p95, "p99": latency_p95, "max": latency_p95 * 2.0 }
            },
            "mcp": { "sessions": 10 },
            "tools": {
                "_initialize": { "avg": 2.0 },
                "calculate_fibonacci": { "avg": 4.0, "p95": 6.0 },
                "process_json_data": { "avg": 6.0 },
                "fetch_external_data": { "avg": 100.0 },
                "simulate_database_query": { "avg": 50.0 }
            }
        }),
    );
}

pub fn write_raw(round: &Path, server: &str, file: &str, body: &str) {
    let path = round.join(server).join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

pub fn write_stats(round: &Path, server: &str, file: &StatsFile) {
    write(
        &round.join(server).join("stats.json"),
        &serde_json::to_value(file).unwrap(),
    );
}

pub fn stats_file(container: &str, samples: Vec<Sample>, cpu_avg: f64, mem_avg: f64) -> StatsFile {
    let extremes = |avg: f64| Extremes {
        avg,
        max: avg,
        min: avg,
    };
    StatsFile {
        container: container.into(),
        poll_interval_s: 1.0,
        sample_count: samples.len(),
        samples,
        summary: Some(ResourceSummary {
            cpu: extremes(cpu_avg),
            memory_mb: extremes(mem_avg),
        }),
    }
}

pub fn servers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
