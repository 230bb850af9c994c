//! cellprov — apply an OMA Client Provisioning document to oFono.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  OfonoGateway (TelephonyPort)      LogEventSink (EventSink)  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          ProvisioningService (pure logic)              │  │
//! │  │  WBXML/XML decoder · resolver · Provisioner            │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status: 0 succeeded, 1 partially succeeded, 2 failed.
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cellprov::adapters::log_sink::LogEventSink;
use cellprov::adapters::ofono::io_task;
use cellprov::app::service::PushMessage;
use cellprov::config::ServiceConfig;
use cellprov::decoder;
use cellprov::fsm::Outcome;

#[derive(Debug, Parser)]
#[command(name = "cellprov", version, about = "Provision oFono data contexts from an OMA CP document")]
struct Cli {
    /// Subscriber identity (IMSI) the document is addressed to
    #[arg(long, env = "CELLPROV_IDENTITY")]
    identity: Option<String>,

    /// Provisioning document (WBXML or XML)
    #[arg(long)]
    file: PathBuf,

    /// Content type the document was pushed with (guessed from the
    /// content when omitted)
    #[arg(long)]
    content_type: Option<String>,

    /// JSON service configuration
    #[arg(long, env = "CELLPROV_CONFIG")]
    config: Option<PathBuf>,

    /// Decode and print the settings without touching the modem
    #[arg(long)]
    decode_only: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match run(cli) {
        Ok(outcome) => exit_code(outcome),
        Err(e) => {
            log::error!("{:#}", e);
            exit_code(Outcome::Failure)
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    let payload =
        std::fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let content_type = cli
        .content_type
        .unwrap_or_else(|| decoder::sniff_content_type(&payload).to_string());

    if cli.decode_only {
        let settings = decoder::decode_payload(&content_type, &payload)?;
        println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
        return Ok(if settings.is_empty() {
            Outcome::Failure
        } else {
            Outcome::Success
        });
    }

    let Some(identity) = cli.identity else {
        bail!("--identity is required unless --decode-only is given");
    };
    let msg = PushMessage {
        content_type,
        identity,
        payload,
    };

    let conn = futures_lite::future::block_on(zbus::Connection::system())
        .context("connecting to the system bus")?;
    info!("Connected to the system bus, talking to {}", config.ofono_service);

    let sink = io_task::run(conn, config, msg, LogEventSink::new())?;
    match sink.last() {
        Some(event) => Ok(event.outcome()),
        None => {
            warn!("Provisioning ended without an outcome");
            Ok(Outcome::Failure)
        }
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::PartialSuccess => ExitCode::from(1),
        Outcome::Failure => ExitCode::from(2),
    }
}
