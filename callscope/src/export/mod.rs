//! Profile export
//!
//! This module turns the completed calls of a stopped profiler into files
//! other tools understand:
//! - [`flamegraph`]: folded-stack lines for `flamegraph.pl`, inferno, speedscope
//! - [`chrome_trace`]: Chrome Trace Event Format for Perfetto / `chrome://tracing`
//!
//! Both refuse to run before the profiler has stopped.

pub mod chrome_trace;
pub mod flamegraph;

pub use chrome_trace::ChromeTraceExporter;
pub use flamegraph::{
    profile_as_flamegraph_log, write_profile_as_flamegraph_log, FlamegraphWriter, TimeUnit,
};
