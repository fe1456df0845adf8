use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use backend_smoke::config::{DEFAULT_ENV_FILE, DEFAULT_ENV_KEY};
use backend_smoke::{ProbeContext, RunConfig, run_suite, runner};
use clap::Parser;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(name = "backend-smoke", version)]
#[command(about = "Smoke test for a web backend's HTTP endpoints", long_about = None)]
struct Args {
    /// File with KEY=value lines holding the backend origin
    #[arg(long, env = "BACKEND_SMOKE_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Key in the env file whose value is the backend origin
    #[arg(long, env = "BACKEND_SMOKE_ENV_KEY", default_value = DEFAULT_ENV_KEY)]
    env_key: String,

    /// Backend origin, skips the env file lookup
    #[arg(long, env = "BACKEND_URL")]
    base_url: Option<String>,

    /// Per-request timeout for the health, CORS and database checks
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(5..=10))]
    timeout_secs: u64,

    /// Timeout for the optional route discovery requests
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(5..=10))]
    discovery_timeout_secs: u64,

    /// Run the probes concurrently
    #[arg(long)]
    concurrent: bool,

    /// Log each request at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_level(true)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = RunConfig {
        env_file: args.env_file,
        env_key: args.env_key,
        base_url: args.base_url,
        request_timeout: Duration::from_secs(args.timeout_secs),
        discovery_timeout: Duration::from_secs(args.discovery_timeout_secs),
        concurrent: args.concurrent,
    };

    let target = config.target().await;
    println!("{}", runner::banner(&target.api_base));

    let ctx = ProbeContext::new(target, &config)?;
    let summary = run_suite(&ctx, config.concurrent).await;
    print!("{summary}");

    info!("Exiting with status {}", summary.exit_status());
    Ok(ExitCode::from(summary.exit_status()))
}
