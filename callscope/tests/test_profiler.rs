use callscope::domain::Operation;
use callscope::hook::{self, ThreadHook};
use callscope::profiling::ManualClock;
use callscope::{
    enter, CallSite, Calls, DescriptionRegistry, Profiler, ProfilerError, ProfilerState, RawEvent,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

fn b() {
    let _guard = enter!("b");
}

fn a() {
    let _guard = enter!("a");
}

fn symbols(calls: &Calls) -> Vec<&str> {
    calls.iter().map(|c| c.description().symbol_name()).collect()
}

#[test]
fn test_flat_calls_share_ancestry() {
    let mut profiler = Profiler::new();
    profiler.start().unwrap();
    b();
    a();
    profiler.stop().unwrap();

    let calls = profiler.calls().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(symbols(calls)[..2], ["b", "a"]);

    let b_frame = calls.get(0).unwrap();
    let a_frame = calls.get(1).unwrap();
    let stopper = calls.last().unwrap();

    assert_eq!(b_frame.parent(), Some(stopper));
    assert_eq!(a_frame.parent(), Some(stopper));
    assert!(stopper.parent().is_none());
    assert!(stopper.duration() >= b_frame.duration());
}

#[test]
fn test_len_is_observed_calls_plus_stopper() {
    let clock = ManualClock::new();
    let mut profiler =
        Profiler::from_parts(ThreadHook, clock.clone(), Arc::new(DescriptionRegistry::new()));
    profiler.start().unwrap();

    let k = 25;
    for i in 0..k {
        hook::deliver(RawEvent::call(CallSite::source("loop.rs", i, "step")));
        if i % 5 == 0 {
            hook::deliver(RawEvent::call(CallSite::native(Some("math"), "sqrt")));
            hook::deliver(RawEvent::ret());
        }
        clock.advance(100);
        hook::deliver(RawEvent::ret());
    }

    profiler.stop().unwrap();
    // 25 steps, 5 nested sqrt calls, plus the caller of stop()
    assert_eq!(profiler.calls().unwrap().len(), 25 + 5 + 1);
}

#[test]
fn test_parent_chain_length_matches_depth() {
    fn nest(levels: u32) {
        let _guard = enter!("nest");
        if levels > 0 {
            nest(levels - 1);
        }
    }

    let mut profiler = Profiler::new();
    profiler.start().unwrap();
    nest(4);
    profiler.stop().unwrap();

    let calls = profiler.calls().unwrap();
    // Innermost first: nest(0) at depth 6 (root, nest × 5)
    let depths: Vec<_> = calls.iter().map(|c| c.depth()).collect();
    assert_eq!(depths, [6, 5, 4, 3, 2, 1]);

    for call in calls {
        let root = call.ancestors().last().unwrap();
        assert!(root.parent().is_none());
        assert_eq!(root, calls.last().unwrap());
    }
}

#[test]
fn test_panic_before_call_records_only_completed_frames() {
    fn caller(raise: bool) {
        let _guard = enter!("caller");
        b();
        assert!(!raise, "raised before a() runs");
        a();
    }

    let mut profiler = Profiler::new();
    profiler.start().unwrap();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| caller(true)));
    profiler.stop().unwrap();

    assert!(outcome.is_err());
    let calls = profiler.calls().unwrap();
    let names = symbols(calls);
    assert_eq!(names[..2], ["b", "caller"]);
    assert_eq!(names.len(), 3);
    assert!(!names.contains(&"a"));
}

#[test]
fn test_same_site_descriptions_are_equal() {
    let mut profiler = Profiler::new();
    profiler.start().unwrap();
    for _ in 0..2 {
        b();
    }
    profiler.stop().unwrap();

    let calls = profiler.calls().unwrap();
    let first = calls.get(0).unwrap().description();
    let second = calls.get(1).unwrap().description();
    assert_eq!(first, second);
    assert!(std::ptr::eq(first, second));
}

#[test]
fn test_lifecycle_is_one_shot() {
    let mut profiler = Profiler::new();
    assert_eq!(profiler.state(), ProfilerState::Idle);
    assert!(matches!(
        profiler.stop(),
        Err(ProfilerError::IllegalState { operation: Operation::Stop, .. })
    ));

    profiler.start().unwrap();
    assert_eq!(profiler.state(), ProfilerState::Running);
    assert!(matches!(
        profiler.start(),
        Err(ProfilerError::IllegalState { operation: Operation::Start, .. })
    ));

    profiler.stop().unwrap();
    assert_eq!(profiler.state(), ProfilerState::Stopped);
    assert!(profiler.start().is_err());
    assert!(profiler.stop().is_err());
}

#[test]
fn test_profilers_on_different_threads_are_independent() {
    let registry = Arc::new(DescriptionRegistry::new());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let mut profiler = Profiler::with_registry(registry);
                profiler.start().unwrap();
                for _ in 0..n {
                    b();
                }
                profiler.stop().unwrap();
                profiler.calls().unwrap().len()
            })
        })
        .collect();

    let lens: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(lens, [1, 2, 3, 4]);
}
