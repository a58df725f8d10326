// Optional DockerRepo tests when Docker daemon is available

use benchmetrics::docker_repo::DockerRepo;
use benchmetrics::sampler::{self, SeriesBuilder};
use std::time::Duration;

#[tokio::test]
async fn docker_repo_fetch_unknown_container_is_an_error() {
    let repo = match DockerRepo::connect() {
        Ok(r) => r,
        Err(_) => return, // Skip when Docker is not available (e.g. CI without Docker)
    };
    let result = repo
        .fetch_sample("benchmetrics-no-such-container-7f3a")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn sampler_skips_every_tick_for_missing_container() {
    let repo = match DockerRepo::connect() {
        Ok(r) => r,
        Err(_) => return,
    };
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut builder = SeriesBuilder::new("benchmetrics-no-such-container-7f3a", Duration::from_secs(1));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let _ = shutdown_tx.send(());
    });
    let counts = sampler::run(&repo, &mut builder, Duration::from_secs(1), shutdown_rx).await;

    assert_eq!(counts.recorded, 0);
    assert!(builder.finish().summary.is_none());
}
