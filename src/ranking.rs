// Per-round rankings. Each dimension declares its polarity and key; servers
// without the key are left out of that dimension only.

use std::cmp::Ordering;

use crate::models::{OrderedMap, ServerRoundRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Lower is better.
    Ascending,
    /// Higher is better.
    Descending,
}

pub struct RankingDimension {
    pub name: &'static str,
    pub label: &'static str,
    pub polarity: Polarity,
    pub key: fn(&ServerRoundRecord) -> Option<f64>,
}

pub const DIMENSIONS: &[RankingDimension] = &[
    RankingDimension {
        name: "latency_avg",
        label: "Best Avg Latency",
        polarity: Polarity::Ascending,
        key: |r| r.http.latency_avg(),
    },
    RankingDimension {
        name: "latency_p95",
        label: "Best P95 Latency",
        polarity: Polarity::Ascending,
        key: |r| r.http.latency_p95(),
    },
    RankingDimension {
        name: "rps",
        label: "Highest RPS",
        polarity: Polarity::Descending,
        key: |r| r.http.rps,
    },
    RankingDimension {
        name: "cpu_efficiency",
        label: "Most CPU Efficient",
        polarity: Polarity::Ascending,
        key: |r| r.cpu_avg(),
    },
    RankingDimension {
        name: "memory_efficiency",
        label: "Most Memory Efficient",
        polarity: Polarity::Ascending,
        key: |r| r.memory_avg(),
    },
];

pub fn dimension(name: &str) -> Option<&'static RankingDimension> {
    DIMENSIONS.iter().find(|d| d.name == name)
}

/// Server ids best-to-worst for one dimension. Equal keys keep map order.
pub fn rank(servers: &OrderedMap<ServerRoundRecord>, dim: &RankingDimension) -> Vec<String> {
    let mut eligible: Vec<(&str, f64)> = servers
        .iter()
        .filter_map(|(name, record)| {
            (dim.key)(record)
                .filter(|v| v.is_finite())
                .map(|v| (name, v))
        })
        .collect();

    // sort_by is stable
    eligible.sort_by(|(_, a), (_, b)| match dim.polarity {
        Polarity::Ascending => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        Polarity::Descending => b.partial_cmp(a).unwrap_or(Ordering::Equal),
    });

    eligible.into_iter().map(|(name, _)| name.to_string()).collect()
}

/// All dimensions with at least one eligible server, in declaration order.
pub fn rank_all(servers: &OrderedMap<ServerRoundRecord>) -> OrderedMap<Vec<String>> {
    DIMENSIONS
        .iter()
        .filter_map(|dim| {
            let order = rank(servers, dim);
            (!order.is_empty()).then(|| (dim.name.to_string(), order))
        })
        .collect()
}
