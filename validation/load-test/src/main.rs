//! GEORADIUS load test CLI.

use anyhow::Result;
use clap::Parser;
use geo_common::DistanceUnit;
use geo_load_test::{BenchConfig, ConfigOverrides, LoadRunner, OutputFormat, ResultsReport};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "geo-load-test")]
#[command(about = "Seed a geo set, then load it with concurrent GEORADIUS queries", long_about = None)]
struct Args {
    /// Store address (host:port or redis:// URL)
    #[arg(long, env = "GEO_ADDR")]
    addr: Option<String>,

    /// Store password
    #[arg(long, env = "GEO_PASSWD", hide_env_values = true)]
    passwd: Option<String>,

    /// The number of coordinates to seed (0 means 100000)
    #[arg(long, env = "GEO_NUM")]
    num: Option<u64>,

    /// Number of requests to run at a time (0 means 1)
    #[arg(short = 'c', long, env = "GEO_CONCURRENCY")]
    concurrency: Option<u32>,

    /// Microseconds to sleep after each request
    #[arg(long, env = "GEO_SLEEP")]
    sleep: Option<u64>,

    /// Search radius
    #[arg(long)]
    radius: Option<f64>,

    /// Radius unit: m, km, mi, ft
    #[arg(long)]
    unit: Option<DistanceUnit>,

    /// Maximum members returned per query
    #[arg(long)]
    count: Option<u32>,

    /// RNG seed for reproducible coordinates
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Path to a scenario YAML file
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Summary format: table (default), json, csv
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            addr: self.addr.clone(),
            password: self.passwd.clone(),
            num: self.num,
            concurrency: self.concurrency,
            sleep_us: self.sleep,
            radius: self.radius,
            unit: self.unit,
            count: self.count,
            seed: self.seed,
            duration_secs: self.duration,
        }
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<BenchConfig> {
    let mut config = match &args.scenario {
        Some(path) => {
            info!(path = %path.display(), "Loading scenario");
            BenchConfig::from_file(path)?
        }
        None => BenchConfig::default(),
    };

    config.apply_overrides(args.overrides());
    config.normalize();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    let runner = LoadRunner::new(config);
    let summary = runner.run().await?;

    println!("{}", ResultsReport::render(&summary, args.output)?);

    Ok(())
}
