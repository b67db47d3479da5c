use anyhow::{Context, Result};
use cbe_client::Verifier;
use cbe_core::ClaimedTransaction;
use cbe_ingest::{extract, validate, LopdfDecoder, RowDecoder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(
    name = "cbe-verify",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CBE_VERIFY_BUILD_SHA"), ")"),
    about = "Verify CBE transfers against the bank's official receipt"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the official receipt and check a claimed transfer against it
    Verify {
        /// Transaction reference, e.g. FT24074ABCDE
        #[arg(long)]
        id: String,

        /// Suffix appended to the reference (account digits after 1000)
        #[arg(long)]
        suffix: String,

        /// Claimed amount in ETB
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        /// Do not print the official receipt details
        #[arg(long)]
        no_details: bool,

        /// Request timeout in seconds (default: config, then 120)
        #[arg(long)]
        timeout: Option<u64>,

        /// Receipt server base URL (default: config)
        #[arg(long)]
        base_url: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract and validate a receipt PDF saved on disk (no network)
    Parse {
        /// Path to the receipt PDF
        pdf: PathBuf,

        /// Print the extracted record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.cbe-verify/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() {
    init_tracing();

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded; `false` maps to exit status 1.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            id,
            suffix,
            amount,
            no_details,
            timeout,
            base_url,
            json,
        } => {
            let cfg = config::load_config()?;
            let mut fetch = cfg.fetch_config();
            if let Some(url) = base_url {
                fetch = fetch.with_base_url(url);
            }
            if let Some(secs) = timeout {
                fetch = fetch.with_timeout_secs(secs);
            }

            let include_details = cfg.output.include_details && !no_details;
            let claim = ClaimedTransaction::new(id, suffix, amount);
            let verifier = Verifier::new(fetch).context("initializing receipt client")?;
            let outcome = verifier.verify(&claim, include_details).await;

            if json || cfg.output.json {
                render::print_json(&outcome)?;
            } else {
                render::print_outcome(&outcome);
            }
            Ok(outcome.is_valid())
        }

        Command::Parse { pdf, json } => {
            let bytes = std::fs::read(&pdf).with_context(|| format!("read {}", pdf.display()))?;
            let pages = LopdfDecoder
                .decode(&bytes)
                .with_context(|| format!("decode {}", pdf.display()))?;
            let draft = extract(&pages);
            let validation = validate(&draft);
            info!(pages = pages.len(), valid = validation.valid, "parsed receipt");

            let report = render::ParseReport {
                valid: validation.valid,
                receipt: &draft,
                missing: &validation.missing,
            };
            if json {
                render::print_json(&report)?;
            } else {
                render::print_parse_report(&report);
            }
            Ok(validation.valid)
        }

        Command::Config { command } => {
            match command {
                ConfigCommand::Init => config::init_config()?,
                ConfigCommand::Show => config::show_config()?,
            }
            Ok(true)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
