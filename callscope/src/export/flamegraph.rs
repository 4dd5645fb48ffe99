//! Flamegraph log writer
//!
//! One line per completed call, in completion order:
//!
//! ```text
//! main.rs:3(<profiled>);lib.rs:10(parse);lib.rs:42(lex) 118
//! └──────────── descriptions, root first ─────────────┘ └ duration
//! ```
//!
//! This is the folded-stack input of `flamegraph.pl` and its ports. Lines are
//! UTF-8. A call appears once per invocation, not aggregated; the
//! visualization tools sum identical stacks themselves.

use log::warn;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe, Location};

use callscope_common::CallSite;

use crate::domain::{Duration, ExportError};
use crate::hook::CallHook;
use crate::profiling::{Calls, Clock, Profiler, ROOT_SYMBOL};

/// Unit of the duration column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    Nanos,
    /// Classic flamegraph logs count microseconds
    #[default]
    Micros,
}

impl TimeUnit {
    #[must_use]
    pub fn convert(self, duration: Duration) -> u64 {
        match self {
            Self::Nanos => duration.as_nanos(),
            Self::Micros => duration.as_micros(),
        }
    }
}

/// Writes completed calls as flamegraph log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct FlamegraphWriter {
    unit: TimeUnit,
}

impl FlamegraphWriter {
    #[must_use]
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }

    /// Write the calls of a stopped profiler
    ///
    /// # Errors
    /// [`ExportError::NotReady`] if the profiler has not stopped, or the
    /// writer's I/O error.
    pub fn write<H, C, W>(&self, profiler: &Profiler<H, C>, writer: W) -> Result<(), ExportError>
    where
        H: CallHook,
        C: Clock + 'static,
        W: Write,
    {
        let calls = profiler.calls().ok_or(ExportError::NotReady)?;
        self.write_calls(calls, writer)?;
        Ok(())
    }

    /// Write an already frozen call list
    ///
    /// # Errors
    /// The writer's I/O error.
    pub fn write_calls<W: Write>(&self, calls: &Calls, mut writer: W) -> io::Result<()> {
        let mut line = String::with_capacity(256);

        for call in calls {
            line.clear();
            for (i, description) in call.stack().into_iter().enumerate() {
                if i > 0 {
                    line.push(';');
                }
                line.push_str(description.as_str());
            }
            // Writing into a String cannot fail
            let _ = writeln!(line, " {}", self.unit.convert(call.duration()));

            writer.write_all(line.as_bytes())?;
        }

        writer.flush()
    }
}

/// Write the calls of a stopped profiler in the classic flamegraph log format
///
/// # Errors
/// Same as [`FlamegraphWriter::write`].
pub fn write_profile_as_flamegraph_log<H, C, W>(
    profiler: &Profiler<H, C>,
    writer: W,
) -> Result<(), ExportError>
where
    H: CallHook,
    C: Clock + 'static,
    W: Write,
{
    FlamegraphWriter::default().write(profiler, writer)
}

/// Profile `work` and write its flamegraph log to `writer`
///
/// The profiler is stopped and the log written on every exit path. If `work`
/// panics, the log is written first and the panic then resumes unchanged.
///
/// ```rust,ignore
/// let mut log = Vec::new();
/// let answer = profile_as_flamegraph_log(&mut log, || solve(input))?;
/// ```
///
/// # Errors
/// [`ExportError::Profiler`] if profiling could not start (another profiler
/// is already active on this thread; `work` is not run then), or the
/// writer's I/O error.
#[track_caller]
pub fn profile_as_flamegraph_log<W, R, F>(writer: W, work: F) -> Result<R, ExportError>
where
    W: Write,
    F: FnOnce() -> R,
{
    let caller = Location::caller();
    let mut profiler = Profiler::new();
    profiler.start_at(CallSite::source(caller.file(), caller.line(), ROOT_SYMBOL))?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(work));

    profiler.stop()?;
    let flushed = write_profile_as_flamegraph_log(&profiler, writer);

    match outcome {
        Ok(value) => flushed.map(|()| value),
        Err(payload) => {
            if let Err(e) = flushed {
                warn!("Flamegraph log not written after panic: {e}");
            }
            panic::resume_unwind(payload)
        }
    }
}
