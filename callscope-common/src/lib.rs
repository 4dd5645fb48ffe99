//! # Shared Vocabulary (Host ↔ Profiler)
//!
//! Defines the call-site identity and the raw notification record that a host
//! execution engine hands to the profiler. Kept `no_std` and dependency-free so
//! that interpreter loops and tracing shims can depend on it without pulling in
//! the profiling engine.
//!
//! ## Key Types
//!
//! - [`CallSite`] - Stable identity of one call site (cache key for descriptions)
//! - [`RawEvent`] - One host notification, tagged with a `TRACE_*` kind
//!
//! The engine's event translator maps the `TRACE_*` kinds onto its three
//! abstract events (call, return, unwind). Kinds it does not understand are
//! logged and dropped.

#![no_std]

// ============================================================================
// Event Kind Constants
// ============================================================================

/// **Call**: a function with source information was entered
///
/// Carries: `site` (must be `Some`)
pub const TRACE_CALL: u32 = 0;

/// **Exception**: an exception was raised inside the current frame
///
/// The frame has not exited yet. If the exception escapes, the host reports
/// a `TRACE_RETURN` (or a `TRACE_UNWIND`) for it afterwards.
pub const TRACE_EXCEPTION: u32 = 1;

/// **Line**: execution moved to a new source line (ignored by the profiler)
pub const TRACE_LINE: u32 = 2;

/// **Return**: the current frame exited, normally or by exception
pub const TRACE_RETURN: u32 = 3;

/// **Native call**: a function without source information was entered
///
/// Carries: `site` (usually [`CallSite::Native`])
pub const TRACE_NATIVE_CALL: u32 = 4;

/// **Native exception**: a native function raised
///
/// Native functions exit immediately when they raise, so this also ends the
/// frame.
pub const TRACE_NATIVE_EXCEPTION: u32 = 5;

/// **Native return**: a native function returned normally
pub const TRACE_NATIVE_RETURN: u32 = 6;

/// **Unwind**: one exceptional exit skipped several frames at once
///
/// Carries: `frames` (number of frames that exited, innermost first)
pub const TRACE_UNWIND: u32 = 7;

// ============================================================================
// Shared Data Structures
// ============================================================================

/// Identity of a call site
///
/// Two calls made from the same place compare equal and hash identically, so
/// a `CallSite` is the cache key for the human-readable description of that
/// place. The strings are `'static` because call sites come from compiled
/// code (`file!()`, `line!()`, `std::panic::Location`) or from a host's
/// interned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSite {
    /// Code with a source location
    Source {
        /// Source file path
        file: &'static str,
        /// Line of the function definition (or of the call)
        line: u32,
        /// Function or method name
        symbol: &'static str,
    },

    /// Source code whose function has no name (module bodies, generated code)
    Unnamed {
        file: &'static str,
        line: u32,
    },

    /// Source code whose file is unknown
    Unlocated {
        symbol: &'static str,
    },

    /// Native code without a source location
    Native {
        /// Defining module, if known
        module: Option<&'static str>,
        /// Function name
        symbol: &'static str,
    },

    /// Native method bound to an object
    Method {
        /// Defining module of the receiver's type, if known
        module: Option<&'static str>,
        /// Method name
        symbol: &'static str,
    },
}

impl CallSite {
    /// Call site with a source location
    #[must_use]
    pub const fn source(file: &'static str, line: u32, symbol: &'static str) -> Self {
        Self::Source { file, line, symbol }
    }

    /// Native call site, optionally qualified by its module
    #[must_use]
    pub const fn native(module: Option<&'static str>, symbol: &'static str) -> Self {
        Self::Native { module, symbol }
    }

    /// Source site without a function name
    #[must_use]
    pub const fn unnamed(file: &'static str, line: u32) -> Self {
        Self::Unnamed { file, line }
    }

    /// Named source site without a file
    #[must_use]
    pub const fn unlocated(symbol: &'static str) -> Self {
        Self::Unlocated { symbol }
    }

    /// Bound native method, optionally qualified by its module
    #[must_use]
    pub const fn method(module: Option<&'static str>, symbol: &'static str) -> Self {
        Self::Method { module, symbol }
    }

    /// Function or method name of this site; `None` for [`CallSite::Unnamed`]
    #[must_use]
    pub const fn symbol(&self) -> Option<&'static str> {
        match self {
            Self::Source { symbol, .. }
            | Self::Unlocated { symbol }
            | Self::Native { symbol, .. }
            | Self::Method { symbol, .. } => Some(symbol),
            Self::Unnamed { .. } => None,
        }
    }
}

/// Notification delivered by a host engine
///
/// Hosts fill `kind` with one of the `TRACE_*` constants. Fields that do not
/// apply to a kind are left at their defaults (`site: None`, `frames: 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Event kind (see constants: `TRACE_CALL`, `TRACE_RETURN`, etc.)
    pub kind: u32,

    /// Call site of the entered function (call kinds only)
    pub site: Option<CallSite>,

    /// Number of frames that exited (`TRACE_UNWIND` only)
    pub frames: u32,
}

impl RawEvent {
    /// `TRACE_CALL` for `site`
    #[must_use]
    pub const fn call(site: CallSite) -> Self {
        Self { kind: TRACE_CALL, site: Some(site), frames: 0 }
    }

    /// `TRACE_NATIVE_CALL` for `site`
    #[must_use]
    pub const fn native_call(site: CallSite) -> Self {
        Self { kind: TRACE_NATIVE_CALL, site: Some(site), frames: 0 }
    }

    /// `TRACE_RETURN`
    #[must_use]
    pub const fn ret() -> Self {
        Self::bare(TRACE_RETURN)
    }

    /// `TRACE_UNWIND` covering `frames` frames
    #[must_use]
    pub const fn unwind(frames: u32) -> Self {
        Self { kind: TRACE_UNWIND, site: None, frames }
    }

    /// Event of `kind` with no payload
    #[must_use]
    pub const fn bare(kind: u32) -> Self {
        Self { kind, site: None, frames: 0 }
    }
}
