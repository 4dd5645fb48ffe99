//! Structured error types for callscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{Operation, ProfilerState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("cannot {operation} a profiler that is {state}")]
    IllegalState { operation: Operation, state: ProfilerState },

    #[error("profiler has not yet run to completion")]
    NotReady,

    #[error(transparent)]
    Hook(#[from] HookError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HookError {
    #[error("a call listener is already registered on this thread")]
    AlreadyRegistered,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("profiler has not yet run")]
    NotReady,

    #[error(transparent)]
    Profiler(#[from] ProfilerError),

    #[error("Failed to write profile: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
