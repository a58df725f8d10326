// Resource sampler: polls a stats source at a fixed interval into an
// append-only series, then flushes once on shutdown.

use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::docker_repo::SampleError;
use crate::docker_repo::stats::round2;
use crate::documents;
use crate::models::{Extremes, ResourceSummary, Sample, StatsFile};

/// Anything that can produce one sample per call for a target container.
pub trait StatsSource {
    fn sample(&self, target: &str) -> impl Future<Output = Result<Sample, SampleError>>;
}

/// In-memory series for one container run. Owned by the polling loop;
/// `finish` consumes it.
#[derive(Debug)]
pub struct SeriesBuilder {
    container: String,
    poll_interval: Duration,
    started_at: DateTime<Utc>,
    samples: Vec<Sample>,
}

impl SeriesBuilder {
    pub fn new(container: impl Into<String>, poll_interval: Duration) -> Self {
        Self::starting_at(container, poll_interval, Utc::now())
    }

    pub fn starting_at(
        container: impl Into<String>,
        poll_interval: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            container: container.into(),
            poll_interval,
            started_at,
            samples: Vec::new(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends a sample, filling `elapsed_s` if unset. A sample not strictly
    /// after the last recorded one is dropped and `false` returned.
    pub fn push(&mut self, mut sample: Sample) -> bool {
        if let Some(last) = self.samples.last()
            && sample.timestamp <= last.timestamp
        {
            warn!(
                container = %self.container,
                timestamp = %sample.timestamp,
                last = %last.timestamp,
                "out-of-order sample dropped"
            );
            return false;
        }
        if sample.elapsed_s.is_none() {
            let elapsed_ms = (sample.timestamp - self.started_at).num_milliseconds().max(0);
            sample.elapsed_s = Some(round2(elapsed_ms as f64 / 1000.0));
        }
        self.samples.push(sample);
        true
    }

    /// Final snapshot of the series. The summary is computed over every
    /// sample and left out entirely when there are none.
    pub fn finish(self) -> StatsFile {
        let summary = summarize(&self.samples);
        StatsFile {
            container: self.container,
            poll_interval_s: self.poll_interval.as_secs_f64(),
            sample_count: self.samples.len(),
            samples: self.samples,
            summary,
        }
    }
}

fn extremes(values: &[f64]) -> Extremes {
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Extremes {
        avg: round2(avg),
        max: round2(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        min: round2(values.iter().copied().fold(f64::INFINITY, f64::min)),
    }
}

/// avg/max/min of CPU and memory over the series; `None` for an empty one.
pub fn summarize(samples: &[Sample]) -> Option<ResourceSummary> {
    if samples.is_empty() {
        return None;
    }
    let cpu: Vec<f64> = samples.iter().map(|s| s.cpu_percent).collect();
    let mem: Vec<f64> = samples.iter().map(|s| s.memory_mb).collect();
    Some(ResourceSummary {
        cpu: extremes(&cpu),
        memory_mb: extremes(&mem),
    })
}

/// Tick outcome counts for one sampler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounts {
    pub recorded: u64,
    pub skipped: u64,
}

/// Polls `source` once per `poll_interval` until `shutdown_rx` fires (or its
/// sender is dropped). Shutdown is checked before each tick; a poll already in
/// flight always completes and is recorded.
#[instrument(
    level = "debug",
    name = "sampler",
    skip_all,
    fields(
        container = %builder.container(),
        poll_interval_ms = poll_interval.as_millis() as u64
    )
)]
pub async fn run<S: StatsSource>(
    source: &S,
    builder: &mut SeriesBuilder,
    poll_interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> TickCounts {
    let mut tick = interval(poll_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut counts = TickCounts::default();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                debug!("Sampler shutting down");
                break;
            }
            _ = tick.tick() => {}
        }

        match source.sample(builder.container()).await {
            Ok(sample) => {
                debug!(
                    cpu_percent = sample.cpu_percent,
                    memory_mb = sample.memory_mb,
                    "sample"
                );
                if builder.push(sample) {
                    counts.recorded += 1;
                } else {
                    counts.skipped += 1;
                }
            }
            Err(e) => {
                counts.skipped += 1;
                warn!(
                    container = %builder.container(),
                    error = %e,
                    operation = "fetch_stats",
                    "stats poll failed; tick skipped"
                );
            }
        }
    }
    counts
}

/// Writes the finished series as pretty JSON, creating parent directories.
pub fn write_stats_file(path: &Path, file: &StatsFile) -> anyhow::Result<()> {
    documents::write_json(path, file)?;
    info!(
        path = %path.display(),
        sample_count = file.sample_count,
        "stats saved"
    );
    Ok(())
}
