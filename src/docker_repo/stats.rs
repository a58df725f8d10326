// Process a raw Docker stats API response into a Sample.

use bollard::models::ContainerStatsResponse;
use chrono::{DateTime, Utc};

use super::SampleError;
use crate::models::Sample;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Rounds to two decimals, the precision samples are recorded at.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// CPU percent from raw cumulative counters. Exactly 0 on a non-positive
/// system delta or a negative container delta (counter reset, first read).
pub fn cpu_percent(cpu_delta: i64, system_delta: i64, online_cpus: u32) -> f64 {
    if system_delta <= 0 || cpu_delta < 0 {
        return 0.0;
    }
    (cpu_delta as f64 / system_delta as f64) * online_cpus as f64 * 100.0
}

/// Usage as a percentage of the limit; 0 when the limit is unknown.
pub fn memory_percent(memory_mb: f64, memory_limit_mb: f64) -> f64 {
    if memory_limit_mb > 0.0 {
        memory_mb / memory_limit_mb * 100.0
    } else {
        0.0
    }
}

/// Process a raw Docker stats response into a Sample. Exposed for unit tests.
pub(crate) fn process_statistics(
    s: &ContainerStatsResponse,
    timestamp: DateTime<Utc>,
) -> Result<Sample, SampleError> {
    let cpu_stats = s
        .cpu_stats
        .as_ref()
        .ok_or(SampleError::MissingField("cpu_stats"))?;
    let precpu_stats = s
        .precpu_stats
        .as_ref()
        .ok_or(SampleError::MissingField("precpu_stats"))?;

    let cpu_usage = cpu_stats
        .cpu_usage
        .as_ref()
        .ok_or(SampleError::MissingField("cpu_stats.cpu_usage"))?;
    let precpu_usage = precpu_stats
        .cpu_usage
        .as_ref()
        .ok_or(SampleError::MissingField("precpu_stats.cpu_usage"))?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1);
    let cpu = cpu_percent(cpu_delta, system_delta, online);

    let memory = s.memory_stats.as_ref();
    let mem_usage = memory.and_then(|m| m.usage).unwrap_or(0);
    let mem_limit = memory.and_then(|m| m.limit).unwrap_or(0);
    // cgroup v1 reports `cache`, cgroup v2 `inactive_file`.
    let mem_cache = memory
        .and_then(|m| m.stats.as_ref())
        .and_then(|st| st.get("cache").or_else(|| st.get("inactive_file")))
        .copied()
        .unwrap_or(0);
    let memory_mb = mem_usage.saturating_sub(mem_cache) as f64 / BYTES_PER_MB;
    let memory_limit_mb = mem_limit as f64 / BYTES_PER_MB;

    let (net_rx_bytes, net_tx_bytes) = s.networks.as_ref().map_or((0u64, 0u64), |n| {
        let mut rx = 0u64;
        let mut tx = 0u64;
        for v in n.values() {
            rx += v.rx_bytes.unwrap_or(0);
            tx += v.tx_bytes.unwrap_or(0);
        }
        (rx, tx)
    });

    Ok(Sample {
        timestamp,
        cpu_percent: round2(cpu),
        memory_mb: round2(memory_mb),
        memory_percent: round2(memory_percent(memory_mb, memory_limit_mb)),
        memory_limit_mb: round2(memory_limit_mb),
        net_rx_bytes,
        net_tx_bytes,
        elapsed_s: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats, ContainerNetworkStats,
        ContainerStatsResponse,
    };
    use std::collections::HashMap;

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-10T18:22:44Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn process_statistics_errors_when_cpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        let err = process_statistics(&s, ts()).unwrap_err();
        assert!(matches!(err, SampleError::MissingField("cpu_stats")));
    }

    #[test]
    fn process_statistics_errors_when_precpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        assert!(process_statistics(&s, ts()).is_err());
    }

    #[test]
    fn process_statistics_computes_cpu_memory_and_network() {
        let mut mem_detail = HashMap::new();
        mem_detail.insert("cache".to_string(), 56 * 1024 * 1024);
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(400 * 1024 * 1024),
                stats: Some(mem_detail),
                ..Default::default()
            }),
            networks: Some({
                let mut m = HashMap::new();
                m.insert(
                    "eth0".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(1000),
                        tx_bytes: Some(2000),
                        ..Default::default()
                    },
                );
                m.insert(
                    "eth1".to_string(),
                    ContainerNetworkStats {
                        rx_bytes: Some(10),
                        tx_bytes: Some(20),
                        ..Default::default()
                    },
                );
                m
            }),
            ..Default::default()
        };
        let out = process_statistics(&s, ts()).unwrap();
        assert_eq!(out.timestamp, ts());
        assert!((out.cpu_percent - 20.0).abs() < 0.01); // (100M-50M)/(1000M-500M) * 2 * 100 = 20
        assert_eq!(out.memory_mb, 200.0);
        assert_eq!(out.memory_limit_mb, 400.0);
        assert_eq!(out.memory_percent, 50.0);
        assert_eq!(out.net_rx_bytes, 1010);
        assert_eq!(out.net_tx_bytes, 2020);
        assert_eq!(out.elapsed_s, None);
    }

    #[test]
    fn process_statistics_uses_inactive_file_on_cgroup_v2() {
        let mut mem_detail = HashMap::new();
        mem_detail.insert("inactive_file".to_string(), 28 * 1024 * 1024);
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(128 * 1024 * 1024),
                stats: Some(mem_detail),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = process_statistics(&s, ts()).unwrap();
        assert_eq!(out.memory_mb, 100.0);
        assert_eq!(out.memory_percent, 0.0); // no limit reported
    }

    #[test]
    fn process_statistics_zero_system_delta_returns_zero_cpu_percent() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 500)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)), // same system_cpu_usage
            ..Default::default()
        };
        let out = process_statistics(&s, ts()).unwrap();
        assert_eq!(out.cpu_percent, 0.0);
        assert_eq!(out.memory_mb, 0.0);
        assert_eq!(out.net_rx_bytes, 0);
    }

    #[test]
    fn cpu_percent_is_zero_for_non_positive_system_delta() {
        assert_eq!(cpu_percent(500, 0, 4), 0.0);
        assert_eq!(cpu_percent(500, -10, 4), 0.0);
        assert_eq!(cpu_percent(-1, 0, 4), 0.0);
    }

    #[test]
    fn cpu_percent_is_zero_for_negative_cpu_delta() {
        assert_eq!(cpu_percent(-100, 1000, 2), 0.0);
    }

    #[test]
    fn cpu_percent_scales_by_online_cpus() {
        assert_eq!(cpu_percent(250, 1000, 1), 25.0);
        assert_eq!(cpu_percent(250, 1000, 4), 100.0);
    }

    #[test]
    fn memory_percent_zero_without_limit() {
        assert_eq!(memory_percent(128.0, 0.0), 0.0);
        assert_eq!(memory_percent(128.0, -1.0), 0.0);
        assert_eq!(memory_percent(128.0, 512.0), 25.0);
    }

    #[test]
    fn memory_never_negative_when_cache_exceeds_usage() {
        let mut mem_detail = HashMap::new();
        mem_detail.insert("cache".to_string(), 10 * 1024 * 1024);
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(1024 * 1024),
                stats: Some(mem_detail),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(process_statistics(&s, ts()).unwrap().memory_mb, 0.0);
    }

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(0.0), 0.0);
    }
}
