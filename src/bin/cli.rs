//! OpenShowVar CLI Client
//!
//! One-shot reads and writes against a controller.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use openshowvar::config::ConfigBuilder;
use openshowvar::network::probe;
use openshowvar::{Config, Result, Session, TextEncoding};
use tracing_subscriber::{fmt, EnvFilter};

/// OpenShowVar CLI
#[derive(Parser, Debug)]
#[command(name = "osv-cli")]
#[command(about = "Read and write robot-controller variables over OpenShowVar")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Controller port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Reply timeout in milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Reject non-ASCII names and values
    #[arg(long)]
    ascii: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a variable
    Read {
        /// Variable name, e.g. $OV_PRO
        name: String,
    },

    /// Write a variable
    Write {
        /// Variable name
        name: String,

        /// New value
        value: String,
    },

    /// Send one keep-alive read
    Ping,

    /// Check that the controller accepts connections
    Probe,
}

fn load_config(args: &Args) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };

    let mut builder = ConfigBuilder::from_config(base);
    if let Some(host) = &args.host {
        builder = builder.host(host.clone());
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(ms) = args.timeout_ms {
        builder = builder.read_timeout_ms(ms);
    }
    if args.ascii {
        builder = builder.text_encoding(TextEncoding::Ascii);
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

/// Connect, run one operation, print its output, close
fn with_session(config: Config, op: impl FnOnce(&mut Session) -> Result<String>) -> Result<ExitCode> {
    let mut session = Session::connect_with(config)?;
    let output = op(&mut session)?;
    println!("{}", output);
    session.close()?;
    Ok(ExitCode::SUCCESS)
}

fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;

    match args.command {
        Commands::Read { name } => with_session(config, |session| {
            let value = session.read(&name)?;
            Ok(String::from_utf8_lossy(&value).into_owned())
        }),
        Commands::Write { name, value } => with_session(config, |session| {
            let echoed = session.write(&name, &value)?;
            Ok(String::from_utf8_lossy(&echoed).into_owned())
        }),
        Commands::Ping => with_session(config, |session| {
            session.keep_alive()?;
            Ok("ok".to_string())
        }),
        Commands::Probe => {
            let addr = config.addr();
            if probe(&addr, config.connect_timeout()) {
                println!("{} is reachable", addr);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{} is not reachable", addr);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
