//! # Host Call-Tracing Hook
//!
//! The profiler does not know how a host engine observes calls. It registers
//! a [`CallListener`] with an injected [`CallHook`] on `start()` and removes it
//! on `stop()`; the hook delivers call, return and unwind notifications
//! synchronously, in execution order, on the profiled thread.
//!
//! ## Bundled Hook: [`ThreadHook`]
//!
//! Keeps the listener in a thread-local slot. Two ways to feed it:
//!
//! ```text
//! Host engine (interpreter loop, tracing shim)
//!     └──► hook::deliver(RawEvent) ──► EventTranslator ──► listener
//!
//! Instrumented Rust code
//!     └──► enter!() / hook::enter(site) ──► CallGuard
//!               call on creation, return on drop (including panics)
//! ```
//!
//! Notifications delivered while no listener is registered are ignored, so
//! instrumented code costs one thread-local lookup when nobody is profiling.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use callscope_common::{CallSite, RawEvent};

use crate::domain::HookError;
use crate::profiling::translator::{EventTranslator, HookEvent};

/// Receiver of call-stack notifications
pub trait CallListener {
    fn on_call(&self, site: CallSite);
    fn on_return(&self);
    /// `frames` functions exited at once, innermost first
    fn on_unwind(&self, frames: usize);
}

/// Capability to observe calls on the current thread
pub trait CallHook {
    /// Install `listener` for the calling thread
    ///
    /// # Errors
    /// Returns [`HookError::AlreadyRegistered`] if the thread already has a
    /// listener; the existing one is left in place.
    fn register(&self, listener: Rc<dyn CallListener>) -> Result<(), HookError>;

    /// Remove the calling thread's listener, if any
    fn deregister(&self);
}

thread_local! {
    static LISTENER: RefCell<Option<Rc<dyn CallListener>>> = const { RefCell::new(None) };
}

/// [`CallHook`] backed by a thread-local listener slot
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadHook;

impl CallHook for ThreadHook {
    fn register(&self, listener: Rc<dyn CallListener>) -> Result<(), HookError> {
        LISTENER.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(HookError::AlreadyRegistered);
            }
            *slot = Some(listener);
            Ok(())
        })
    }

    fn deregister(&self) {
        // The slot is gone during thread teardown; nothing left to remove then
        let _ = LISTENER.try_with(|slot| slot.borrow_mut().take());
    }
}

/// Whether a listener is registered on the current thread
#[must_use]
pub fn is_registered() -> bool {
    LISTENER.try_with(|slot| slot.borrow().is_some()).unwrap_or(false)
}

/// Report a raw host notification on the current thread
pub fn deliver(raw: RawEvent) {
    if let Some(event) = EventTranslator.translate(&raw) {
        dispatch(event);
    }
}

/// Report that `frames` functions exited at once
///
/// For hosts that skip several frames in one step. Do not combine with
/// [`CallGuard`]s for the same frames: each guard reports its own return.
pub fn unwind(frames: usize) {
    deliver(RawEvent::unwind(u32::try_from(frames).unwrap_or(u32::MAX)));
}

#[inline]
fn dispatch(event: HookEvent) {
    let _ = LISTENER.try_with(|slot| {
        if let Some(listener) = slot.borrow().as_ref() {
            event.dispatch(listener.as_ref());
        }
    });
}

/// Report entry into `site` and return a guard that reports the exit
pub fn enter(site: CallSite) -> CallGuard {
    deliver(RawEvent::call(site));
    CallGuard { _thread_bound: PhantomData }
}

/// RAII guard for one instrumented call. Reports the return on drop.
///
/// Drop runs on every exit path, including panics, so the profiler sees a
/// return for each frame a panic unwinds through. Not `Send`: the return has
/// to be reported on the thread that reported the call.
#[must_use = "dropping the guard immediately records a zero-length call; bind it with `let _guard = ...`"]
pub struct CallGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        deliver(RawEvent::ret());
    }
}

/// Instrument the enclosing function
///
/// `enter!()` describes the call site with the current file, line and
/// function path; `enter!("name")` overrides the symbol name.
///
/// ```rust,ignore
/// fn parse(input: &str) -> Ast {
///     let _guard = callscope::enter!();
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! enter {
    () => {
        $crate::hook::enter($crate::CallSite::source(file!(), line!(), $crate::function_name!()))
    };
    ($symbol:expr) => {
        $crate::hook::enter($crate::CallSite::source(file!(), line!(), $symbol))
    };
}

/// Path of the enclosing function, e.g. `my_crate::parser::parse`
#[doc(hidden)]
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}
