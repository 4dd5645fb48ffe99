//! # Profiler Lifecycle and Call Stack
//!
//! ```text
//!   Idle ──start()──► Running ──stop()──► Stopped
//!                        │
//!      on_call ──────────┤ registry lookup, arena.activate, push index
//!      on_return ────────┤ pop index, arena.promote, append to completed
//!      on_unwind(n) ─────┘ on_return × n, one clock reading
//! ```
//!
//! `start()` pushes an activation for the code that called it, so the frame
//! that eventually calls `stop()` is recorded. `stop()` finalizes only that
//! top frame. Activations still beneath it are sealed at the stop time and
//! kept as ancestry for the recorded frames, but are not recorded.
//!
//! Every notification handler is O(1) amortized and allocation-free apart
//! from vector growth.

use std::cell::RefCell;
use std::mem;
use std::panic::Location;
use std::rc::Rc;
use std::sync::Arc;

use callscope_common::CallSite;
use log::{debug, warn};

use super::arena::{FrameArena, FrameId};
use super::clock::{Clock, MonotonicClock};
use super::frame::Calls;
use crate::description::DescriptionRegistry;
use crate::domain::{Operation, ProfilerError, ProfilerState, Timestamp};
use crate::hook::{CallHook, CallListener, ThreadHook};

/// Symbol of the activation pushed by `start()` for its caller
pub const ROOT_SYMBOL: &str = "<profiled>";

const INITIAL_FRAME_CAPACITY: usize = 4096;
const INITIAL_STACK_CAPACITY: usize = 64;

/// Deterministic call-stack profiler for one thread
///
/// Records every call observed through its [`CallHook`] between `start()` and
/// `stop()`. Not `Send`: a profiler belongs to the thread it profiles.
///
/// ```rust,ignore
/// let mut profiler = Profiler::new();
/// profiler.start()?;
/// work();
/// profiler.stop()?;
///
/// for call in profiler.calls().unwrap() {
///     println!("{} {}", call.description(), call.duration());
/// }
/// ```
pub struct Profiler<H: CallHook = ThreadHook, C: Clock + 'static = MonotonicClock> {
    hook: H,
    recorder: Rc<Recorder<C>>,
    calls: Option<Calls>,
}

impl Profiler {
    /// Profiler on the current thread's [`ThreadHook`] with its own registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(DescriptionRegistry::new()))
    }

    /// Profiler on the current thread's [`ThreadHook`] sharing `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<DescriptionRegistry>) -> Self {
        Self::from_parts(ThreadHook, MonotonicClock::new(), registry)
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: CallHook, C: Clock + 'static> Profiler<H, C> {
    /// Profiler observing `hook`, timed by `clock`, describing sites through
    /// `registry`
    pub fn from_parts(hook: H, clock: C, registry: Arc<DescriptionRegistry>) -> Self {
        Self { hook, recorder: Rc::new(Recorder::new(clock, registry)), calls: None }
    }

    /// Start recording
    ///
    /// The caller's source location describes the root activation.
    ///
    /// # Errors
    /// [`ProfilerError::IllegalState`] unless the profiler is idle;
    /// [`ProfilerError::Hook`] if the hook refuses the listener, in which case
    /// the profiler stays idle.
    #[track_caller]
    pub fn start(&mut self) -> Result<(), ProfilerError> {
        let caller = Location::caller();
        self.start_at(CallSite::source(caller.file(), caller.line(), ROOT_SYMBOL))
    }

    /// Start recording, describing the root activation with `site`
    ///
    /// # Errors
    /// Same as [`Profiler::start`].
    pub fn start_at(&mut self, site: CallSite) -> Result<(), ProfilerError> {
        self.start_with_stack(&[site])
    }

    /// Start recording on top of a call chain the host is already inside
    ///
    /// `stack` lists the live frames outermost first. Each becomes an
    /// activation stamped with the start time and parented on the previous
    /// one, so returns from these frames after `start` are recorded against
    /// their real callers and every recorded stack begins at `stack[0]`. An
    /// empty `stack` seeds the caller's location, like [`Profiler::start`].
    ///
    /// # Errors
    /// Same as [`Profiler::start`].
    #[track_caller]
    pub fn start_with_stack(&mut self, stack: &[CallSite]) -> Result<(), ProfilerError> {
        let state = self.state();
        if state != ProfilerState::Idle {
            return Err(ProfilerError::IllegalState { operation: Operation::Start, state });
        }

        let caller;
        let stack = if stack.is_empty() {
            let location = Location::caller();
            caller = [CallSite::source(location.file(), location.line(), ROOT_SYMBOL)];
            &caller[..]
        } else {
            stack
        };

        let listener: Rc<dyn CallListener> = self.recorder.clone();
        self.hook.register(listener)?;
        self.recorder.session.borrow_mut().begin(stack);

        debug!("Profiler started with {} seeded frames, innermost {:?}", stack.len(), stack.last());
        Ok(())
    }

    /// Stop recording and freeze the completed calls
    ///
    /// The innermost active call (the one invoking `stop()`) is finalized as
    /// if it had returned and becomes the last entry of [`Profiler::calls`].
    ///
    /// # Errors
    /// [`ProfilerError::IllegalState`] unless the profiler is running.
    pub fn stop(&mut self) -> Result<(), ProfilerError> {
        let state = self.state();
        if state != ProfilerState::Running {
            return Err(ProfilerError::IllegalState { operation: Operation::Stop, state });
        }

        self.hook.deregister();
        let calls = self.recorder.session.borrow_mut().finish();

        debug!(
            "Profiler stopped: {} calls recorded over {}",
            calls.len(),
            calls.session_duration()
        );
        self.calls = Some(calls);
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> ProfilerState {
        self.recorder.session.borrow().state
    }

    /// Completed calls; `None` until the profiler has stopped
    #[must_use]
    pub fn calls(&self) -> Option<&Calls> {
        self.calls.as_ref()
    }

    /// Completed calls, or [`ProfilerError::NotReady`] until stopped
    ///
    /// # Errors
    /// [`ProfilerError::NotReady`] while idle or running.
    pub fn try_calls(&self) -> Result<&Calls, ProfilerError> {
        self.calls.as_ref().ok_or(ProfilerError::NotReady)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DescriptionRegistry> {
        &self.recorder.registry
    }
}

impl<H: CallHook, C: Clock + 'static> Drop for Profiler<H, C> {
    fn drop(&mut self) {
        if self.state() == ProfilerState::Running {
            warn!("Profiler dropped while running; detaching from the call hook");
            self.hook.deregister();
        }
    }
}

/// Listener half of a [`Profiler`], shared with the hook while running
struct Recorder<C> {
    registry: Arc<DescriptionRegistry>,
    session: RefCell<Session<C>>,
}

impl<C: Clock> Recorder<C> {
    fn new(clock: C, registry: Arc<DescriptionRegistry>) -> Self {
        let session = Session {
            state: ProfilerState::Idle,
            clock,
            registry: Arc::clone(&registry),
            arena: FrameArena::default(),
            active: Vec::new(),
            completed: Vec::new(),
            started_at: Timestamp::default(),
            unbalanced_returns: 0,
        };
        Self { registry, session: RefCell::new(session) }
    }
}

impl<C: Clock> CallListener for Recorder<C> {
    #[inline]
    fn on_call(&self, site: CallSite) {
        let mut session = self.session.borrow_mut();
        if session.state == ProfilerState::Running {
            session.push(site);
        }
    }

    #[inline]
    fn on_return(&self) {
        let popped = {
            let mut session = self.session.borrow_mut();
            if session.state != ProfilerState::Running {
                return;
            }
            let now = session.clock.now();
            session.pop(now)
        };
        popped.report();
    }

    fn on_unwind(&self, frames: usize) {
        let mut popped = Pop::Completed;
        {
            let mut session = self.session.borrow_mut();
            if session.state != ProfilerState::Running {
                return;
            }
            let now = session.clock.now();
            for _ in 0..frames {
                popped = session.pop(now);
                if popped != Pop::Completed {
                    break;
                }
            }
        }
        popped.report();
    }
}

/// Outcome of completing the innermost activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pop {
    Completed,
    /// The stack was already empty; `first` for the session's first such return
    Unbalanced { first: bool },
}

impl Pop {
    /// Log contract violations; call only once the session borrow is released,
    /// since an instrumented log backend re-enters the listener
    fn report(self) {
        if self == (Pop::Unbalanced { first: true }) {
            warn!("Return notification with an empty call stack; host events are unbalanced");
        }
    }
}

/// Mutable state of one profiling session
struct Session<C> {
    state: ProfilerState,
    clock: C,
    registry: Arc<DescriptionRegistry>,
    arena: FrameArena,
    /// Active activations, innermost last
    active: Vec<FrameId>,
    /// Completed activations in completion order
    completed: Vec<FrameId>,
    started_at: Timestamp,
    unbalanced_returns: u64,
}

impl<C: Clock> Session<C> {
    /// Seed `stack` (outermost first) as live activations
    fn begin(&mut self, stack: &[CallSite]) {
        self.arena = FrameArena::with_capacity(INITIAL_FRAME_CAPACITY);
        self.active = Vec::with_capacity(INITIAL_STACK_CAPACITY.max(stack.len()));
        self.completed = Vec::with_capacity(INITIAL_FRAME_CAPACITY);
        self.state = ProfilerState::Running;
        self.started_at = self.clock.now();

        for &site in stack {
            let description = self.registry.lookup_or_create(site);
            let parent = self.active.last().copied();
            let id = self.arena.activate(description, self.started_at, parent);
            self.active.push(id);
        }
    }

    #[inline]
    fn push(&mut self, site: CallSite) {
        let description = self.registry.lookup_or_create(site);
        let parent = self.active.last().copied();
        let id = self.arena.activate(description, self.clock.now(), parent);
        self.active.push(id);
    }

    /// Complete the innermost activation
    #[inline]
    fn pop(&mut self, at: Timestamp) -> Pop {
        if let Some(id) = self.active.pop() {
            self.arena.promote(id, at);
            self.completed.push(id);
            return Pop::Completed;
        }

        self.unbalanced_returns += 1;
        Pop::Unbalanced { first: self.unbalanced_returns == 1 }
    }

    fn finish(&mut self) -> Calls {
        let now = self.clock.now();
        if let Some(id) = self.active.pop() {
            self.arena.promote(id, now);
            self.completed.push(id);
        }

        let abandoned = mem::take(&mut self.active);
        if !abandoned.is_empty() {
            debug!("{} active frames abandoned at stop", abandoned.len());
        }
        self.arena.seal(&abandoned, now);
        self.state = ProfilerState::Stopped;

        Calls::new(
            mem::take(&mut self.arena),
            mem::take(&mut self.completed),
            self.started_at,
            now,
            self.unbalanced_returns,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Duration;
    use crate::hook;
    use crate::profiling::clock::ManualClock;
    use callscope_common::RawEvent;

    fn site(symbol: &'static str) -> CallSite {
        CallSite::source("workload.rs", 1, symbol)
    }

    fn manual_profiler() -> (Profiler<ThreadHook, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let profiler =
            Profiler::from_parts(ThreadHook, clock.clone(), Arc::new(DescriptionRegistry::new()));
        (profiler, clock)
    }

    fn symbols(calls: &Calls) -> Vec<&str> {
        calls.iter().map(|c| c.description().symbol_name()).collect()
    }

    #[test]
    fn test_nested_calls_complete_innermost_first() {
        let (mut profiler, clock) = manual_profiler();
        profiler.start_at(site("root")).unwrap();

        clock.advance(10);
        hook::deliver(RawEvent::call(site("a")));
        clock.advance(10);
        hook::deliver(RawEvent::call(site("b")));
        clock.advance(5);
        hook::deliver(RawEvent::ret());
        clock.advance(5);
        hook::deliver(RawEvent::ret());
        clock.advance(10);

        profiler.stop().unwrap();
        let calls = profiler.calls().unwrap();

        assert_eq!(symbols(calls), ["b", "a", "root"]);
        assert_eq!(calls.get(0).unwrap().duration(), Duration(5));
        assert_eq!(calls.get(1).unwrap().duration(), Duration(20));
        assert_eq!(calls.get(2).unwrap().duration(), Duration(40));
        assert_eq!(calls.get(0).unwrap().depth(), 3);
    }

    #[test]
    fn test_unwind_finalizes_each_skipped_frame() {
        let (mut profiler, clock) = manual_profiler();
        profiler.start_at(site("root")).unwrap();

        hook::deliver(RawEvent::call(site("a")));
        hook::deliver(RawEvent::call(site("b")));
        hook::deliver(RawEvent::call(site("c")));
        clock.advance(7);
        hook::deliver(RawEvent::unwind(2));

        profiler.stop().unwrap();
        let calls = profiler.calls().unwrap();

        assert_eq!(symbols(calls), ["c", "b", "a"]);
        assert_eq!(calls.get(0).unwrap().duration(), Duration(7));
        // `a` is the frame that called stop(); root is only ancestry now
        assert_eq!(calls.last().unwrap().parent().unwrap().description().symbol_name(), "root");
    }

    #[test]
    fn test_stop_abandons_frames_below_top() {
        let (mut profiler, clock) = manual_profiler();
        profiler.start_at(site("root")).unwrap();

        hook::deliver(RawEvent::call(site("outer")));
        hook::deliver(RawEvent::call(site("inner")));
        clock.advance(3);
        profiler.stop().unwrap();

        let calls = profiler.calls().unwrap();
        assert_eq!(symbols(calls), ["inner"]);

        let inner = calls.get(0).unwrap();
        let chain: Vec<_> = inner.stack().iter().map(|d| d.symbol_name()).collect();
        assert_eq!(chain, ["root", "outer", "inner"]);
        // Sealed at the stop time, so the chain is still nested
        assert_eq!(inner.parent().unwrap().duration(), Duration(3));
    }

    #[test]
    fn test_unbalanced_returns_are_counted_not_popped_past_empty() {
        let (mut profiler, _clock) = manual_profiler();
        profiler.start_at(site("root")).unwrap();

        hook::deliver(RawEvent::ret()); // pops root
        hook::deliver(RawEvent::ret());
        hook::deliver(RawEvent::unwind(3));

        profiler.stop().unwrap();
        let calls = profiler.calls().unwrap();
        assert_eq!(symbols(calls), ["root"]);
        assert_eq!(calls.unbalanced_returns(), 2);
    }

    #[test]
    fn test_seeded_stack_is_live_ancestry() {
        let (mut profiler, clock) = manual_profiler();
        clock.advance(100);
        profiler.start_with_stack(&[site("main"), site("serve"), site("handle")]).unwrap();

        clock.advance(10);
        hook::deliver(RawEvent::call(site("work")));
        clock.advance(5);
        hook::deliver(RawEvent::ret());
        // Returns from frames that were live before start
        hook::deliver(RawEvent::ret());
        clock.advance(20);
        hook::deliver(RawEvent::ret());

        profiler.stop().unwrap();
        let calls = profiler.calls().unwrap();

        assert_eq!(symbols(calls), ["work", "handle", "serve", "main"]);
        assert_eq!(calls.unbalanced_returns(), 0);

        let work = calls.get(0).unwrap();
        let chain: Vec<_> = work.stack().iter().map(|d| d.symbol_name()).collect();
        assert_eq!(chain, ["main", "serve", "handle", "work"]);
        assert_eq!(work.started_at(), Duration(10));

        // Seeded frames are stamped with the start time
        let handle = calls.get(1).unwrap();
        assert_eq!(handle.started_at(), Duration::ZERO);
        assert_eq!(handle.duration(), Duration(15));
        assert_eq!(calls.get(2).unwrap().duration(), Duration(35));
    }

    #[test]
    fn test_empty_seed_falls_back_to_caller() {
        let (mut profiler, _clock) = manual_profiler();
        profiler.start_with_stack(&[]).unwrap();
        profiler.stop().unwrap();

        let root = profiler.calls().unwrap().last().unwrap();
        assert_eq!(root.description().symbol_name(), ROOT_SYMBOL);
        assert!(root.description().source_location().unwrap().contains("profiler.rs:"));
    }

    mod reentrant_log {
        use super::*;
        use log::{LevelFilter, Log, Metadata, Record};
        use std::cell::Cell;

        thread_local! {
            static INSTRUMENTED: Cell<bool> = const { Cell::new(false) };
        }

        /// Logger whose write path is itself instrumented on opted-in threads
        struct InstrumentedLogger;

        impl Log for InstrumentedLogger {
            fn enabled(&self, _: &Metadata<'_>) -> bool {
                true
            }

            fn log(&self, _: &Record<'_>) {
                if INSTRUMENTED.with(Cell::get) {
                    let _guard = hook::enter(CallSite::native(Some("log"), "write"));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: InstrumentedLogger = InstrumentedLogger;

        #[test]
        fn test_unbalanced_warning_tolerates_instrumented_logger() {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Warn);
            }
            INSTRUMENTED.with(|flag| flag.set(true));

            let (mut profiler, _clock) = manual_profiler();
            profiler.start_at(site("root")).unwrap();
            hook::deliver(RawEvent::ret());
            hook::deliver(RawEvent::ret());
            hook::deliver(RawEvent::unwind(2));

            INSTRUMENTED.with(|flag| flag.set(false));
            profiler.stop().unwrap();

            let calls = profiler.calls().unwrap();
            assert_eq!(calls.unbalanced_returns(), 2);
            // The logger's own call, made during the first unbalanced return
            assert!(symbols(calls).contains(&"write"));
        }
    }

    #[test]
    fn test_lifecycle_errors() {
        let (mut profiler, _clock) = manual_profiler();

        assert!(matches!(
            profiler.stop(),
            Err(ProfilerError::IllegalState { operation: Operation::Stop, state: ProfilerState::Idle })
        ));
        assert!(matches!(profiler.try_calls(), Err(ProfilerError::NotReady)));

        profiler.start().unwrap();
        assert!(matches!(
            profiler.start(),
            Err(ProfilerError::IllegalState { state: ProfilerState::Running, .. })
        ));
        assert!(profiler.calls().is_none());

        profiler.stop().unwrap();
        assert!(!hook::is_registered());
        assert!(matches!(
            profiler.start(),
            Err(ProfilerError::IllegalState { state: ProfilerState::Stopped, .. })
        ));
        assert!(matches!(profiler.stop(), Err(ProfilerError::IllegalState { .. })));
        assert_eq!(profiler.try_calls().unwrap().len(), 1);
    }

    #[test]
    fn test_root_is_described_by_caller_location() {
        let (mut profiler, _clock) = manual_profiler();
        profiler.start().unwrap();
        profiler.stop().unwrap();

        let root = profiler.calls().unwrap().last().unwrap();
        assert_eq!(root.description().symbol_name(), ROOT_SYMBOL);
        assert!(root.description().source_location().unwrap().contains("profiler.rs:"));
    }

    #[test]
    fn test_busy_hook_leaves_profiler_idle() {
        let (mut first, _clock) = manual_profiler();
        let (mut second, _clock2) = manual_profiler();

        first.start().unwrap();
        assert!(matches!(second.start(), Err(ProfilerError::Hook(_))));
        assert_eq!(second.state(), ProfilerState::Idle);

        first.stop().unwrap();
        second.start().unwrap();
        second.stop().unwrap();
    }

    #[test]
    fn test_drop_while_running_detaches() {
        {
            let (mut profiler, _clock) = manual_profiler();
            profiler.start().unwrap();
            assert!(hook::is_registered());
        }
        assert!(!hook::is_registered());
    }

    #[test]
    fn test_events_after_stop_are_ignored() {
        let (mut profiler, _clock) = manual_profiler();
        profiler.start().unwrap();
        profiler.stop().unwrap();

        hook::deliver(RawEvent::call(site("late")));
        hook::deliver(RawEvent::ret());

        assert_eq!(profiler.calls().unwrap().len(), 1);
    }
}
