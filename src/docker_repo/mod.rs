// Docker container stats via bollard

pub mod stats;

use crate::models::Sample;
use crate::sampler::StatsSource;
use bollard::Docker;
use bollard::query_parameters::StatsOptions;
use futures_util::StreamExt;

/// Why one stats poll produced no sample.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("docker API: {0}")]
    Transport(#[from] bollard::errors::Error),
    #[error("stats endpoint returned no response")]
    EmptyResponse,
    #[error("stats response missing {0}")]
    MissingField(&'static str),
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self { docker })
    }

    /// One non-streaming read of the stats endpoint for `target` (name or id).
    pub async fn fetch_sample(&self, target: &str) -> Result<Sample, SampleError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(target, Some(options));
        let response = stream.next().await.ok_or(SampleError::EmptyResponse)??;
        stats::process_statistics(&response, chrono::Utc::now())
    }
}

impl StatsSource for DockerRepo {
    async fn sample(&self, target: &str) -> Result<Sample, SampleError> {
        self.fetch_sample(target).await
    }
}
