//! # callscope - Main Entry Point
//!
//! Profiles one of the bundled demo workloads and writes the result as a
//! flamegraph log (default) or a Chrome trace, to stdout or `--output FILE`.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};

use callscope::cli::{workload, Args, OutputFormat};
use callscope::{ChromeTraceExporter, FlamegraphWriter, Profiler, ProfilerState};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    // clap exits with status 2 on usage errors
    let args = Args::parse();

    if !args.quiet {
        eprintln!("callscope v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("workload: {:?} (depth {})", args.workload, args.depth);
    }

    let mut profiler = Profiler::new();
    profiler.start().context("Failed to start profiler")?;

    // A panicking workload still produces a profile; its frames were
    // returned by their guards while the panic unwound.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| workload::run(args.workload, args.depth)));

    profiler.stop().context("Failed to stop profiler")?;
    debug_assert_eq!(profiler.state(), ProfilerState::Stopped);

    match &outcome {
        Ok(value) => info!("Workload returned {value}"),
        Err(_) => warn!("Workload panicked; writing the calls recorded up to the panic"),
    }

    let calls = profiler.try_calls()?;
    if !args.quiet {
        eprintln!("calls: {} in {}", calls.len(), calls.session_duration());
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.format {
        OutputFormat::Flamegraph => FlamegraphWriter::new(args.unit.into())
            .write(&profiler, &mut writer)
            .context("Failed to write flamegraph log")?,
        OutputFormat::Chrome => ChromeTraceExporter::new()
            .export(&profiler, &mut writer)
            .context("Failed to export Chrome trace")?,
    }
    writer.flush()?;

    if !args.quiet {
        if let Some(path) = &args.output {
            eprintln!("saved: {}", path.display());
        }
    }

    if outcome.is_err() {
        anyhow::bail!("workload panicked");
    }
    Ok(())
}
