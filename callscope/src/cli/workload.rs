//! Instrumented demo programs
//!
//! Each function opens a [`CallGuard`](crate::hook::CallGuard) with
//! [`enter!`](crate::enter), so the running profiler sees a call on entry and
//! a return on every exit path.

use callscope_common::{CallSite, RawEvent, TRACE_NATIVE_RETURN};

use super::args::Workload;
use crate::hook;

/// Run `workload` at `depth` and return its result
///
/// # Panics
/// [`Workload::Panic`] always panics once the recursion reaches `depth`.
pub fn run(workload: Workload, depth: u32) -> u64 {
    let _guard = crate::enter!("run");
    match workload {
        Workload::Fib => fib(depth),
        Workload::Tree => tree_sum(&build(depth)),
        Workload::Panic => descend(depth),
    }
}

fn fib(n: u32) -> u64 {
    let _guard = crate::enter!("fib");
    if n < 2 {
        u64::from(n)
    } else {
        fib(n - 1) + fib(n - 2)
    }
}

struct Node {
    value: u64,
    children: Vec<Node>,
}

fn build(height: u32) -> Node {
    let _guard = crate::enter!("build");
    let children = if height == 0 { Vec::new() } else { vec![build(height - 1), build(height - 1)] };
    Node { value: u64::from(height), children }
}

fn tree_sum(node: &Node) -> u64 {
    let _guard = crate::enter!("tree_sum");
    node.children.iter().fold(node.value, |acc, child| add(acc, tree_sum(child)))
}

/// Addition reported as a native call, the way a host reports builtins
fn add(a: u64, b: u64) -> u64 {
    const SITE: CallSite = CallSite::native(Some("u64"), "saturating_add");
    hook::deliver(RawEvent::native_call(SITE));
    let sum = a.saturating_add(b);
    hook::deliver(RawEvent::bare(TRACE_NATIVE_RETURN));
    sum
}

fn descend(remaining: u32) -> u64 {
    let _guard = crate::enter!("descend");
    if remaining == 0 {
        panic!("workload reached the bottom of its recursion");
    }
    descend(remaining - 1) + 1
}
