//! Profiling engine
//!
//! - `profiler`: lifecycle state machine and the active call stack
//! - `arena`: append-only frame storage with in-place promotion
//! - `frame`: frozen completed calls and their ancestry views
//! - `translator`: raw host notifications → call / return / unwind
//! - `clock`: monotonic and manual time sources

pub(crate) mod arena;
pub mod clock;
pub mod frame;
pub mod profiler;
pub mod translator;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use frame::{Ancestors, Calls, Iter, ProfilerFrame};
pub use profiler::{Profiler, ROOT_SYMBOL};
pub use translator::{EventTranslator, HookEvent};
