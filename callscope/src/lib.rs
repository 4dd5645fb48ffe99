//! # callscope - Deterministic Call-Stack Profiler
//!
//! callscope records every function call and return on one thread between
//! `start()` and `stop()`, measures how long each call took, and keeps the
//! full nesting chain of every call. The result is written as a flamegraph
//! log or a Chrome trace.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Profiled Code / Host Engine                  │
//! │          enter!() guards        hook::deliver(RawEvent)         │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ call / return / unwind, in order
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      callscope (This Crate)                     │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Hook      │──▶│  Translator  │──▶│   Profiler   │         │
//! │  │ (ThreadHook) │   │  (RawEvent)  │   │ (call stack) │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │                                               │                 │
//! │                     ┌──────────────┐          │                 │
//! │                     │ Description  │◀─────────┤ once per site   │
//! │                     │  Registry    │          │                 │
//! │                     └──────────────┘          ▼                 │
//! │                                        ┌──────────────┐         │
//! │                                        │    Export    │         │
//! │                                        │ (flamegraph, │         │
//! │                                        │ chrome trace)│         │
//! │                                        └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: the profiler state machine, frame arena, clocks and event
//!   translation
//! - [`hook`]: the call-tracing capability the profiler registers with, plus
//!   the `enter!` instrumentation macro
//! - [`description`]: rendering and caching of call-site descriptions
//! - [`export`]: flamegraph log writer, scoped profiling helper, Chrome trace
//! - [`domain`]: time newtypes, lifecycle states and errors
//! - [`cli`]: argument parsing and demo workloads for the `callscope` binary
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use std::fs::File;
//!
//! fn fib(n: u32) -> u64 {
//!     let _guard = callscope::enter!();
//!     if n < 2 { u64::from(n) } else { fib(n - 1) + fib(n - 2) }
//! }
//!
//! let file = File::create("fib.log")?;
//! let value = callscope::profile_as_flamegraph_log(file, || fib(20))?;
//! ```
//!
//! ## Key Concepts
//!
//! - **Activation**: an entered call that has not returned yet
//! - **Completed call**: an activation with its end time fixed; the `calls`
//!   sequence lists them innermost-first, in completion order
//! - **Ancestry**: each call links to its caller, up to the activation
//!   pushed by `start()`
//! - **Description**: `file:line(symbol)` or `<module.symbol>`, shared by
//!   every call from the same site

pub mod cli;
pub mod description;
pub mod domain;
pub mod export;
pub mod hook;
pub mod profiling;

pub use callscope_common::{CallSite, RawEvent};

pub use description::{Description, DescriptionRegistry};
pub use domain::{Duration, ExportError, HookError, ProfilerError, ProfilerState};
pub use export::{
    profile_as_flamegraph_log, write_profile_as_flamegraph_log, ChromeTraceExporter,
    FlamegraphWriter, TimeUnit,
};
pub use hook::{enter, CallGuard, CallHook, CallListener, ThreadHook};
pub use profiling::{Calls, Profiler, ProfilerFrame};
