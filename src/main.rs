use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::{interval, sleep_until, Duration, Instant, MissedTickBehavior};

use dual_gnss_compass::config::InertialSource;
use dual_gnss_compass::health::HealthMonitor;
use dual_gnss_compass::{runtime, Config, SharedState};

#[derive(Parser, Debug)]
#[command(name = "gnss_compass")]
#[command(about = "Dual-GNSS heading and baseline error, optionally blended with a gyro", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base receiver serial device
    #[arg(long)]
    base: Option<PathBuf>,

    /// Rover receiver serial device
    #[arg(long)]
    rover: Option<PathBuf>,

    /// Baud rate for both receivers
    #[arg(long)]
    baud: Option<u32>,

    /// Antenna separation in metres
    #[arg(long)]
    baseline: Option<f64>,

    /// Weight of the GNSS bearing in the heading blend (0..1)
    #[arg(long)]
    alpha: Option<f64>,

    /// Use synthetic receivers and gyro instead of hardware
    #[arg(long)]
    simulate: bool,

    /// Gyro source: an IIO device directory, "sim" or "none"
    #[arg(long)]
    imu: Option<String>,

    /// Write the latest snapshot as JSON here on every status tick
    #[arg(long)]
    status_file: Option<PathBuf>,

    /// Seconds between status lines
    #[arg(long, default_value = "2")]
    status_interval: u64,
}

fn parse_imu(value: &str) -> InertialSource {
    match value {
        "none" | "off" => InertialSource::None,
        "sim" | "simulated" => InertialSource::Simulated,
        path => InertialSource::Iio {
            device: PathBuf::from(path),
        },
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(path) = &args.base {
        config.base.path = path.clone();
    }
    if let Some(path) = &args.rover {
        config.rover.path = path.clone();
    }
    if let Some(baud) = args.baud {
        config.base.baud_rate = baud;
        config.rover.baud_rate = baud;
    }
    if let Some(baseline) = args.baseline {
        config.fusion.baseline_length_m = baseline;
    }
    if let Some(alpha) = args.alpha {
        config.fusion.blend_weight = alpha;
    }
    if let Some(imu) = &args.imu {
        config.inertial.source = parse_imu(imu);
    }
    config.simulate |= args.simulate;

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn report(state: &SharedState, monitor: &HealthMonitor, status_file: Option<&PathBuf>) {
    let snapshot = state.snapshot();
    log::info!("{}", snapshot.summary());
    log::debug!("{}", monitor.format_status(&snapshot));

    if let Some(path) = status_file {
        if let Err(e) = snapshot.save(path) {
            log::warn!("failed to write {}: {}", path.display(), e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    log::info!("gnss_compass starting");
    log::info!("  Duration: {} seconds (0=continuous)", args.duration);
    if config.simulate {
        log::info!("  Receivers: simulated");
    } else {
        log::info!("  Base: {}", config.base.path.display());
        log::info!("  Rover: {}", config.rover.path.display());
    }
    log::info!("  Baseline: {:.3} m, alpha {:.2}", config.fusion.baseline_length_m, config.fusion.blend_weight);

    let state = SharedState::new();
    let workers = runtime::spawn(&config, state.clone())?;
    match workers.imu_period() {
        Some(period) => log::info!("  Gyro: every {} ms", period.as_millis()),
        None => log::info!("  Gyro: none, heading is GNSS only"),
    }
    let monitor = HealthMonitor::from_config(&config.health, workers.imu_scheduled());

    let deadline = (args.duration > 0).then(|| Instant::now() + Duration::from_secs(args.duration));
    let mut ticker = interval(Duration::from_secs(args.status_interval.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let until_deadline = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = ticker.tick() => report(&state, &monitor, args.status_file.as_ref()),
            _ = &mut ctrl_c => {
                log::info!("interrupted, stopping...");
                break;
            }
            _ = until_deadline => {
                log::info!("duration reached, stopping...");
                break;
            }
        }
    }

    workers.shutdown().await;
    report(&state, &monitor, args.status_file.as_ref());
    Ok(())
}
