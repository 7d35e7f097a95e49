//! PRNG Lab Server
//!
//! REST API for the linear congruential generator and its test suite.

use clap::Parser;
use prng_server::config::{build_config, CliArgs as ConfigCliArgs, Environment};
use prng_server::server::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PRNG Lab Server - REST API for the LCG lab
#[derive(Parser, Debug)]
#[command(name = "prng_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "PRNG_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PRNG_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PRNG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Largest sequence length accepted per request
    #[arg(long, env = "PRNG_MAX_COUNT")]
    max_count: Option<u64>,

    /// Cap on period search iterations
    #[arg(long, env = "PRNG_MAX_ITERATIONS")]
    max_iterations: Option<u64>,

    /// Largest number of Cesàro pairs accepted per request
    #[arg(long, env = "PRNG_MAX_PAIRS")]
    max_pairs: Option<u64>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            max_count: args.max_count,
            max_iterations: args.max_iterations,
            max_pairs: args.max_pairs,
        }
    }
}

fn init_tracing(log_level: &str, environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    init_tracing(config.log_level.as_filter_str(), config.environment);

    tracing::info!("PRNG Lab Server v{}", prng_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        environment = %config.environment,
        max_count = config.limits.max_count,
        max_iterations = config.limits.max_iterations,
        period_memory_bound_mb = config.limits.period_memory_bound_bytes() / 1_000_000,
        max_pairs = config.limits.max_pairs,
        shutdown_timeout_secs = config.shutdown_timeout_secs,
        "Server configuration loaded"
    );

    let server = Server::new(config);
    tracing::info!(address = %server.socket_addr(), "Starting server");

    server.run().await?;

    Ok(())
}
