//! courtres CLI - claims a court the moment booking opens.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Settings;
use courtres_core::compute_target_date;
use courtres_execution::{Clock, Reservation, RunError, SystemClock};
use courtres_webdriver::WebDriverProvider;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "courtres")]
#[command(about = "Claims a pickleball court the instant booking opens", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for the claim instant and book
    Run(RunArgs),
    /// Print the resolved profile and target date without opening a browser
    Plan(RunArgs),
}

/// Options shared by `run` and `plan`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rehearsal run: afternoon block, no waiting, booking cancelled
    #[arg(long, env = "TEST_MODE")]
    pub test_mode: bool,

    /// Live run, even if TEST_MODE or the config file asks for a rehearsal
    #[arg(long)]
    pub live: bool,

    /// Account email
    #[arg(long, env = "RESERVE_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "RESERVE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Court to try, in preference order (repeatable)
    #[arg(long = "court")]
    pub courts: Vec<String>,

    /// Slot label to claim, in order (repeatable). Labels may start with '-'
    #[arg(long = "slot", allow_hyphen_values = true)]
    pub slots: Vec<String>,

    /// Claim instant, HH:MM[:SS] local time [default: 14:00:00]
    #[arg(long)]
    pub at: Option<courtres_execution::ClaimInstant>,

    /// Fail unless every slot of the block is claimed
    #[arg(long)]
    pub require_all: bool,

    /// WebDriver endpoint [default: http://localhost:4444]
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save a screenshot here when a run fails
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan(args) => {
            let settings = Settings::from_args(&args)?;
            let today = SystemClock.now().date();
            let target = compute_target_date(today, settings.profile.test_mode());
            let plan = json!({
                "profile": settings.profile,
                "target_date": target,
                "calendar_label": target.calendar_label(),
                "claim_at": settings.claim_at,
                "gated": !settings.profile.test_mode(),
                "webdriver_url": settings.webdriver.url,
            });
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run(&args).await,
    }
}

async fn run(args: &RunArgs) -> Result<ExitCode> {
    let settings = Settings::from_args(args)?;
    let credentials = settings.require_credentials()?;

    let mut reservation = Reservation::new(settings.profile.clone(), credentials)
        .with_site(settings.site)
        .with_timings(settings.timings)
        .with_claim_at(settings.claim_at);
    if let Some(dir) = settings.screenshot_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating screenshot directory {}", dir.display()))?;
        reservation = reservation.with_screenshot_dir(dir);
    }

    info!(
        run_id = %reservation.run_id(),
        test_mode = settings.profile.test_mode(),
        "Connecting to {}",
        settings.webdriver.url
    );
    let provider = WebDriverProvider::new(settings.webdriver);

    match reservation.run(&provider).await {
        Ok(report) => {
            let message = if report.test_mode {
                "Court reserved and cancelled (rehearsal)"
            } else {
                "Court reserved successfully"
            };
            info!("{}", message);
            let mut output = serde_json::to_value(&report)?;
            output["message"] = json!(message);
            output["success"] = json!(true);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(RunError::Run(failure)) => {
            error!("{}", failure);
            let output = json!({
                "success": false,
                "test_mode": settings.profile.test_mode(),
                "state": failure.state,
                "error_kind": failure.error.kind(),
                "error": failure.error.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("reservation run could not start"),
    }
}
