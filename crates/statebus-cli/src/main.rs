//! statebus command-line tool
//!
//! Replays recorded state transitions through an event bus and prints the
//! events they trigger.

mod formatter;
mod replay;
mod script;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use formatter::OutputFormat;
use statebus::{BusConfig, DispatchMode, EventNaming};

/// statebus command-line tool
#[derive(Parser, Debug)]
#[command(name = "statebus")]
#[command(version, about = "Replay state transitions through a statebus event bus")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Bus configuration file (JSON)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Multi-key dispatch mode
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeArg>,

    /// Sigil prefix stripped from state keys
    #[arg(long, global = true)]
    pub sigil: Option<char>,

    /// Suffix appended to derived event names
    #[arg(long, global = true)]
    pub suffix: Option<String>,

    /// Output format
    #[arg(long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch every transition of a snapshot file
    Replay {
        /// JSON-lines file: initial snapshot, then one snapshot per line
        file: PathBuf,

        /// Only listen on these events (default: every event)
        #[arg(short = 'l', long = "listen")]
        listen: Vec<String>,
    },
    /// Print the events derived from the first snapshot of a file
    Events {
        /// JSON-lines snapshot file
        file: PathBuf,
    },
}

/// Dispatch mode as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Only the first changed key of each transition
    First,
    /// Every changed key
    Each,
}

impl From<ModeArg> for DispatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::First => DispatchMode::FirstChange,
            ModeArg::Each => DispatchMode::EachChange,
        }
    }
}

impl Args {
    /// Build the bus configuration: file first, then flag overrides.
    pub fn bus_config(&self) -> Result<BusConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => BusConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => BusConfig::default(),
        };

        if let Some(mode) = self.mode {
            config = config.with_dispatch_mode(mode.into());
        }
        if self.sigil.is_some() || self.suffix.is_some() {
            let sigil = self.sigil.unwrap_or(config.naming.sigil);
            let suffix = self
                .suffix
                .clone()
                .unwrap_or_else(|| config.naming.suffix.clone());
            config = config.with_naming(EventNaming::new(sigil, suffix));
        }

        Ok(config)
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statebus=info,statebus_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.bus_config()?;

    tracing::debug!(
        mode = ?config.dispatch_mode,
        sigil = %config.naming.sigil,
        suffix = %config.naming.suffix,
        "configuration loaded"
    );

    match &args.command {
        Command::Replay { file, listen } => run_replay(file, listen, config, args.format),
        Command::Events { file } => run_events(file, config, args.format),
    }
}

/// Replay every transition of a snapshot file.
fn run_replay(
    file: &Path,
    listen: &[String],
    config: BusConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshots = script::load_snapshots(&std::fs::read_to_string(file)?)?;
    tracing::info!(
        file = %file.display(),
        transitions = snapshots.len().saturating_sub(1),
        "replaying"
    );

    let steps = replay::replay(snapshots, config, listen)?;
    for step in &steps {
        println!("{}", formatter::format_step(step, format));
    }

    Ok(())
}

/// Print the derived event table.
fn run_events(
    file: &Path,
    config: BusConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshots = script::load_snapshots(&std::fs::read_to_string(file)?)?;
    let bindings = config.naming.derive(&snapshots[0]);

    println!("{}", formatter::format_bindings(&bindings, format));
    Ok(())
}
