use callscope::{CallSite, DescriptionRegistry};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_concurrent_lookups_share_one_description() {
    let registry = Arc::new(DescriptionRegistry::new());
    let barrier = Arc::new(Barrier::new(8));
    let site = CallSite::source("shared.rs", 12, "hot");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.lookup_or_create(site)
            })
        })
        .collect();

    let descriptions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 1);
    for description in &descriptions[1..] {
        assert!(Arc::ptr_eq(&descriptions[0], description));
    }
    assert_eq!(descriptions[0].as_str(), "shared.rs:12(hot)");
}

#[test]
fn test_distinct_sites_get_distinct_entries() {
    let registry = DescriptionRegistry::new();
    assert!(registry.is_empty());

    let a = registry.lookup_or_create(CallSite::source("a.rs", 1, "f"));
    let b = registry.lookup_or_create(CallSite::source("a.rs", 2, "f"));
    let native = registry.lookup_or_create(CallSite::native(Some("math"), "floor"));
    let builtin = registry.lookup_or_create(CallSite::native(None, "len"));

    assert_ne!(a, b);
    assert_eq!(native.as_str(), "<math.floor>");
    assert_eq!(builtin.as_str(), "<len>");
    assert_eq!(registry.len(), 4);
    assert!(registry.get(&CallSite::native(None, "len")).is_some());
    assert!(registry.get(&CallSite::native(None, "abs")).is_none());
}

#[test]
fn test_many_threads_many_sites() {
    const SYMBOLS: [&str; 4] = ["w", "x", "y", "z"];
    let registry = Arc::new(DescriptionRegistry::new());

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for line in 0..50 {
                    for symbol in SYMBOLS {
                        registry.lookup_or_create(CallSite::source("many.rs", line, symbol));
                    }
                }
            });
        }
    });

    assert_eq!(registry.len(), 200);
}
