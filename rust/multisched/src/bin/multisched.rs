//! multisched: run a multilevel-feedback scheduling simulation over a
//! workload file and print the execution chart and statistics.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use multisched::{init_tracing, write_report, SimConfig, Simulator, Workload};

/// Run a multilevel-feedback scheduling simulation over a workload file.
#[derive(Parser)]
#[command(name = "multisched")]
struct Cli {
    /// Path to the workload file (`<id> <class> <arrival> <service> <priority>` per line).
    workload: Option<PathBuf>,

    /// TOML file with `high_slice`, `medium_slice` and `start_time`.
    #[arg(short, long, env = "MULTISCHED_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ticks the dispatcher favors High before switching to Medium.
    #[arg(long, value_name = "TICKS")]
    high_slice: Option<u32>,

    /// Ticks the dispatcher favors Medium before switching to High.
    #[arg(long, value_name = "TICKS")]
    medium_slice: Option<u32>,

    /// Tick at which the simulation clock starts.
    #[arg(long, value_name = "TICK")]
    start_time: Option<u32>,

    /// Print trace events to stderr.
    #[arg(long)]
    dump_trace: bool,

    /// Write Perfetto trace JSON to file.
    #[arg(long, value_name = "PATH")]
    perfetto: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::from_path(path)?,
        None => SimConfig::default(),
    };
    if let Some(ticks) = cli.high_slice {
        config = config.high_slice(ticks);
    }
    if let Some(ticks) = cli.medium_slice {
        config = config.medium_slice(ticks);
    }
    if let Some(tick) = cli.start_time {
        config = config.start_time(tick);
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let Some(workload_path) = &cli.workload else {
        anyhow::bail!("usage: multisched <WORKLOAD>: input file must be specified");
    };

    let config = load_config(cli)?;
    let workload = Workload::from_path(workload_path)?;

    let result = Simulator::new(workload.tasks, config)
        .run()
        .context("simulation aborted")?;

    if cli.dump_trace {
        result.trace.dump();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&result, &mut out).context("failed to write report")?;
    out.flush()?;

    if let Some(path) = &cli.perfetto {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        result
            .write_perfetto_json(&mut file)
            .context("failed to write perfetto trace")?;
        eprintln!("wrote perfetto trace to {}", path.display());
    }

    Ok(())
}
