use anyhow::Result;
use benchmetrics::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "benchmetrics",
    version,
    about = "Container resource sampling and benchmark result consolidation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample a container's resource usage until SIGTERM/SIGINT, then write the series
    Collect {
        /// Container name or id
        container: String,
        /// Output JSON file
        output: PathBuf,
        /// Poll interval in seconds (default from config, 1s)
        #[arg(value_parser = parse_interval)]
        poll_interval_s: Option<f64>,
    },
    /// Merge one round's per-server reports into summary.json with rankings
    Consolidate {
        /// Round directory holding one subdirectory per server
        results_dir: PathBuf,
    },
    /// Compare repeated rounds: means, variance and compute/I-O cost split
    Analyze {
        /// Round directories, each with a summary.json
        #[arg(required = true)]
        rounds: Vec<PathBuf>,
        /// How rounds with missing data are averaged
        #[arg(long, value_enum)]
        mode: Option<models::AveragingMode>,
        /// Also write the aggregates as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_interval(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("invalid poll interval '{s}' (expected seconds, e.g. 1 or 0.5)"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("poll interval must be > 0, got {s}"))
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn collect(
    container: String,
    output: PathBuf,
    poll_interval: Duration,
) -> Result<()> {
    let docker = docker_repo::DockerRepo::connect()?;
    let mut builder = sampler::SeriesBuilder::new(&container, poll_interval);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    tracing::info!(
        container = %container,
        output = %output.display(),
        poll_interval_s = poll_interval.as_secs_f64(),
        "collecting stats; send SIGTERM/SIGINT to stop"
    );
    let counts = sampler::run(&docker, &mut builder, poll_interval, shutdown_rx).await;
    tracing::info!(
        recorded = counts.recorded,
        skipped = counts.skipped,
        "sampling stopped"
    );

    let file = builder.finish();
    sampler::write_stats_file(&output, &file)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = config::AppConfig::load()?;
    tracing::debug!("{}", version::banner());

    match cli.command {
        Command::Collect {
            container,
            output,
            poll_interval_s,
        } => {
            let poll_interval = poll_interval_s
                .map(Duration::from_secs_f64)
                .unwrap_or_else(|| Duration::from_millis(app_config.sampler.poll_interval_ms));
            collect(container, output, poll_interval).await?;
        }
        Command::Consolidate { results_dir } => {
            let summary = consolidate::consolidate_and_write(
                &results_dir,
                &app_config.benchmark.servers,
                &app_config.benchmark.run,
                &app_config.files,
            )?;
            print!("{}", consolidate::render_round_table(&summary));
        }
        Command::Analyze {
            rounds,
            mode,
            output,
        } => {
            let mode = mode.unwrap_or(app_config.analysis.averaging);
            let report = aggregate::analyze(&rounds, &app_config, mode)?;
            println!("{}", aggregate::render_variance_table(&report));
            println!("{}", aggregate::render_cost_table(&report));
            if let Some(path) = output {
                documents::write_json(&path, &report)?;
                tracing::info!(path = %path.display(), "analysis saved");
            }
        }
    }

    Ok(())
}
