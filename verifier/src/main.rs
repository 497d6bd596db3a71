//! `data-verifier` - run the verification routine for one submission and
//! print the verdict together with the response word for the dispatcher.
//!
//! Limits come from `VERIFIER_*` environment variables (see
//! [`VerifierConfig::from_env`]); command-line flags override them.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use data_verifier::config::parse_gateways;
use data_verifier::{HttpFetcher, Verdict, Verifier, VerifierConfig, VerifyError};

#[derive(Parser)]
#[command(name = "data-verifier")]
#[command(
    about = "Fetch a submission and its bounty schema and check one against the other",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Content identifier of the submitted data
    data_cid: String,

    /// Content identifier of the bounty's schema
    schema_cid: String,

    /// Gateway tried before the configured list
    #[arg(long, env = "VERIFIER_GATEWAY_OVERRIDE")]
    gateway: Option<String>,

    /// Comma-separated gateway base URLs (replaces the defaults)
    #[arg(long)]
    gateways: Option<String>,

    /// Total wall-clock budget in milliseconds
    #[arg(long)]
    total_timeout_ms: Option<u64>,

    /// Per-fetch timeout in milliseconds
    #[arg(long)]
    fetch_timeout_ms: Option<u64>,

    /// Maximum outbound fetches per run
    #[arg(long)]
    max_fetches: Option<usize>,

    /// Maximum response size in bytes
    #[arg(long)]
    max_response_bytes: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<VerifierConfig, VerifyError> {
        let mut config = VerifierConfig::from_env()?;
        if let Some(list) = &self.gateways {
            config.gateways = parse_gateways(list);
        }
        if let Some(ms) = self.total_timeout_ms {
            config.limits.total_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.limits.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = self.max_fetches {
            config.limits.max_fetches = n;
        }
        if let Some(n) = self.max_response_bytes {
            config.limits.max_response_bytes = n;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct Report {
    verdict: Verdict,
    /// Hex of the 32-byte word returned to the dispatcher.
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "data_verifier=debug"
    } else {
        "data_verifier=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> Result<Report, VerifyError> {
    let config = cli.config()?;
    let verifier = Verifier::new(HttpFetcher::new()?, config);

    let outcome = verifier
        .evaluate(&cli.data_cid, &cli.schema_cid, cli.gateway.as_deref())
        .await;
    let verdict = if outcome.is_ok() {
        Verdict::Verified
    } else {
        Verdict::Rejected
    };

    Ok(Report {
        verdict,
        response: verdict.encode().iter().map(|b| format!("{b:02x}")).collect(),
        reason: outcome.err().map(|e| e.to_string()),
    })
}
