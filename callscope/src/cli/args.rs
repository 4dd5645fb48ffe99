//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::export::TimeUnit;

#[derive(Parser, Debug)]
#[command(
    name = "callscope",
    about = "Profile an instrumented workload and write its call stacks",
    after_help = "\
EXAMPLES:
    callscope                                 Profile fib(20), flamegraph log on stdout
    callscope --workload tree --depth 6       Profile a recursive tree walk
    callscope --output fib.log                Write the log to a file
    callscope --format chrome -o trace.json   Chrome trace for Perfetto"
)]
pub struct Args {
    /// Demo program to profile
    #[arg(short, long, value_enum, default_value_t = Workload::Fib)]
    pub workload: Workload,

    /// Recursion depth (fib argument, tree height)
    #[arg(short, long, default_value = "20")]
    pub depth: u32,

    /// Write output to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Flamegraph)]
    pub format: OutputFormat,

    /// Unit of flamegraph durations
    #[arg(long, value_enum, default_value_t = Unit::Us)]
    pub unit: Unit,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Naive recursive Fibonacci
    Fib,
    /// Binary tree build and sum, with a native leaf call
    Tree,
    /// Recursion that panics at the bottom
    Panic,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Folded stacks for flamegraph.pl / inferno
    Flamegraph,
    /// Chrome Trace Event JSON
    Chrome,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Us,
    Ns,
}

impl From<Unit> for TimeUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Us => Self::Micros,
            Unit::Ns => Self::Nanos,
        }
    }
}
