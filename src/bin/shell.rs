//! OpenShowVar Interactive Shell
//!
//! Menu loop over one controller connection, with background keep-alive and
//! watched-variable polling.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::Term;
use openshowvar::config::ConfigBuilder;
use openshowvar::network::{probe, Scheduler};
use openshowvar::shell::{menu, ActivityLog, Shell, Step};
use openshowvar::{Config, OsvError, Result, SharedSession};
use tracing_subscriber::{fmt, EnvFilter};

/// OpenShowVar shell
#[derive(Parser, Debug)]
#[command(name = "osv-shell")]
#[command(about = "Interactive robot-controller variable shell")]
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

    /// Keep-alive period in seconds (overrides the config file)
    #[arg(long)]
    keep_alive_secs: Option<u64>,

    /// Poll a variable, repeatable (NAME or NAME@SECONDS, default 10 s)
    #[arg(short, long = "watch")]
    watch: Vec<String>,

    /// Ignore watch entries from the config file
    #[arg(long)]
    no_watch: bool,
}

fn parse_watch(raw: &str) -> Result<(String, u64)> {
    match raw.split_once('@') {
        None => Ok((raw.to_string(), 10)),
        Some((name, secs)) => {
            let secs = secs
                .parse()
                .map_err(|_| OsvError::Config(format!("invalid watch interval in {:?}", raw)))?;
            Ok((name.to_string(), secs))
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut base = match &args.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    if args.no_watch {
        base.watch.clear();
    }

    let mut builder = ConfigBuilder::from_config(base);
    if let Some(host) = &args.host {
        builder = builder.host(host.clone());
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(secs) = args.keep_alive_secs {
        builder = builder.keep_alive_interval_secs(secs);
    }
    for raw in &args.watch {
        let (name, secs) = parse_watch(raw)?;
        builder = builder.watch(name, secs);
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let addr = config.addr();

    if !probe(&addr, config.connect_timeout()) {
        return Err(OsvError::Connect {
            addr,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "controller not reachable"),
        });
    }

    let session = SharedSession::connect_with(config.clone())?;
    let log = ActivityLog::open(&config.value_log, &config.connection_log)?;
    let (scheduler, events) = Scheduler::from_config(session.clone(), &config)?;
    let mut shell = Shell::new(session.clone(), log, Some(events));

    let term = Term::stdout();
    term.clear_screen()?;
    println!("{}", shell.announce(&config.identity_var)?);

    let stdin = io::stdin();
    loop {
        print!("{}", menu(&addr));
        io::stdout().flush()?;

        let mut line = String::new();
        // EOF on stdin behaves like `q`
        let step = if stdin.lock().read_line(&mut line)? == 0 {
            shell.step("q")?
        } else {
            shell.step(&line)?
        };

        match step {
            Step::Continue(output) if output.is_empty() => {}
            Step::Continue(output) => println!("\n{}\n", output),
            Step::ClearScreen => term.clear_screen()?,
            Step::Quit => {
                println!("\nDisconnected.\n");
                break;
            }
        }
    }

    scheduler.stop();
    drop(shell);
    session.close()
}

fn main() -> ExitCode {
    // Logs go to stderr so they do not interleave with the menu
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
