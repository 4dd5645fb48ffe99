//! # Event Translation
//!
//! Maps raw host notifications onto the three events the profiler
//! understands.
//!
//! ## Event Routing
//!
//! - `TRACE_CALL`, `TRACE_NATIVE_CALL` → [`HookEvent::Call`]
//! - `TRACE_RETURN`, `TRACE_NATIVE_RETURN` → [`HookEvent::Return`]
//! - `TRACE_NATIVE_EXCEPTION` → [`HookEvent::Return`] (a raising native
//!   function exits at once)
//! - `TRACE_UNWIND(n)` → [`HookEvent::Unwind`]
//! - `TRACE_EXCEPTION`, `TRACE_LINE` → dropped (the frame is still live)

use callscope_common::{
    CallSite, RawEvent, TRACE_CALL, TRACE_EXCEPTION, TRACE_LINE, TRACE_NATIVE_CALL,
    TRACE_NATIVE_EXCEPTION, TRACE_NATIVE_RETURN, TRACE_RETURN, TRACE_UNWIND,
};
use log::warn;

use crate::hook::CallListener;

/// Abstract notification consumed by a [`CallListener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// A function at `CallSite` was entered
    Call(CallSite),
    /// The innermost active function exited
    Return,
    /// This many functions exited at once, innermost first
    Unwind(usize),
}

impl HookEvent {
    /// Hand the event to `listener`
    #[inline]
    pub fn dispatch(self, listener: &dyn CallListener) {
        match self {
            Self::Call(site) => listener.on_call(site),
            Self::Return => listener.on_return(),
            Self::Unwind(frames) => listener.on_unwind(frames),
        }
    }
}

/// Stateless adapter from [`RawEvent`] to [`HookEvent`]
#[derive(Debug, Default, Clone, Copy)]
pub struct EventTranslator;

impl EventTranslator {
    /// Translate one raw notification; `None` when it has no effect on the
    /// call stack
    #[inline]
    #[must_use]
    pub fn translate(&self, raw: &RawEvent) -> Option<HookEvent> {
        match raw.kind {
            TRACE_CALL | TRACE_NATIVE_CALL => match raw.site {
                Some(site) => Some(HookEvent::Call(site)),
                None => {
                    warn!("Call event (kind {}) without a call site, dropped", raw.kind);
                    None
                }
            },
            TRACE_RETURN | TRACE_NATIVE_RETURN | TRACE_NATIVE_EXCEPTION => Some(HookEvent::Return),
            TRACE_UNWIND if raw.frames > 0 => {
                Some(HookEvent::Unwind(usize::try_from(raw.frames).unwrap_or(usize::MAX)))
            }
            TRACE_UNWIND | TRACE_EXCEPTION | TRACE_LINE => None,
            other => {
                warn!("Unknown event kind: {other}");
                None
            }
        }
    }
}
