//! Simulated Controller Binary
//!
//! Serves the OpenShowVar protocol from an in-memory variable table.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use openshowvar::sim::{SimServer, VariableTable};
use tracing_subscriber::{fmt, EnvFilter};

/// OpenShowVar simulated controller
#[derive(Parser, Debug)]
#[command(name = "osv-sim")]
#[command(about = "Simulated robot controller speaking the OpenShowVar protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    listen: String,

    /// Preset variable, repeatable (NAME=VALUE)
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Start without the default variables ($OV_PRO, $ROBNAME[])
    #[arg(long)]
    empty: bool,

    /// Drop connections idle for this many milliseconds (0 = never)
    #[arg(long, default_value = "0")]
    idle_timeout_ms: u64,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {:?}", raw)),
    }
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,openshowvar=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("OpenShowVar simulated controller v{}", openshowvar::VERSION);

    let table = if args.empty {
        VariableTable::new()
    } else {
        VariableTable::with_defaults()
    };
    for (name, value) in args.vars {
        table.set(name, value);
    }
    tracing::info!("Serving {} variables", table.len());

    let server = match SimServer::bind(&args.listen, Arc::new(table)) {
        Ok(server) => server.with_idle_timeout_ms(args.idle_timeout_ms),
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
