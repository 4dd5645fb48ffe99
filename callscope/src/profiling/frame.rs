//! Completed-call records
//!
//! [`Calls`] is the frozen output of a profiling session: the arena plus the
//! completion order. [`ProfilerFrame`] is a cheap `Copy` view of one slot in
//! it; following [`ProfilerFrame::parent`] walks the nesting chain up to the
//! root.

use std::fmt;
use std::iter::FusedIterator;
use std::slice;

use super::arena::{FrameArena, FrameId};
use crate::description::Description;
use crate::domain::{Duration, Timestamp};

/// Frozen, ordered sequence of completed calls
///
/// Ordered by completion: the deepest, soonest-finishing call first, the call
/// that invoked `stop()` last.
#[derive(Debug)]
pub struct Calls {
    arena: FrameArena,
    order: Vec<FrameId>,
    started_at: Timestamp,
    stopped_at: Timestamp,
    unbalanced_returns: u64,
}

impl Calls {
    pub(crate) fn new(
        arena: FrameArena,
        order: Vec<FrameId>,
        started_at: Timestamp,
        stopped_at: Timestamp,
        unbalanced_returns: u64,
    ) -> Self {
        Self { arena, order, started_at, stopped_at, unbalanced_returns }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `index`-th completed call
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ProfilerFrame<'_>> {
        self.order.get(index).map(|&id| ProfilerFrame { calls: self, id })
    }

    /// The call that completed last (normally the one that invoked `stop()`)
    #[must_use]
    pub fn last(&self) -> Option<ProfilerFrame<'_>> {
        self.order.last().map(|&id| ProfilerFrame { calls: self, id })
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { calls: self, ids: self.order.iter() }
    }

    /// Time between `start()` and `stop()`
    #[must_use]
    pub fn session_duration(&self) -> Duration {
        self.stopped_at.saturating_duration_since(self.started_at)
    }

    /// Return notifications that arrived with nothing left on the stack
    ///
    /// Non-zero means the host broke its ordering contract; the affected
    /// returns were ignored.
    #[must_use]
    pub fn unbalanced_returns(&self) -> u64 {
        self.unbalanced_returns
    }

    fn frame(&self, id: FrameId) -> ProfilerFrame<'_> {
        ProfilerFrame { calls: self, id }
    }
}

impl<'a> IntoIterator for &'a Calls {
    type Item = ProfilerFrame<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`Calls`] in completion order
#[derive(Clone)]
pub struct Iter<'a> {
    calls: &'a Calls,
    ids: slice::Iter<'a, FrameId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = ProfilerFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|&id| self.calls.frame(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.ids.next_back().map(|&id| self.calls.frame(id))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}

/// One completed call
///
/// A view into [`Calls`]; copying it is free. The parent of a recorded call
/// may itself be absent from `Calls` when it was still running at `stop()`:
/// such frames exist only to complete the ancestry chain, and their duration
/// runs up to the stop timestamp.
#[derive(Clone, Copy)]
pub struct ProfilerFrame<'a> {
    calls: &'a Calls,
    id: FrameId,
}

impl<'a> ProfilerFrame<'a> {
    #[must_use]
    pub fn description(&self) -> &'a Description {
        &self.calls.arena.get(self.id).description
    }

    /// Elapsed time of the call, in nanoseconds
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.calls.arena.get(self.id).duration()
    }

    /// The caller of this call, or `None` for the root
    #[must_use]
    pub fn parent(&self) -> Option<ProfilerFrame<'a>> {
        self.calls.arena.get(self.id).parent.map(|id| self.calls.frame(id))
    }

    /// This frame followed by each of its ancestors up to the root
    #[must_use]
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors { next: Some(*self) }
    }

    /// Nesting depth at completion, counting this frame (the root has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Descriptions from the root down to this frame, inclusive
    #[must_use]
    pub fn stack(&self) -> Vec<&'a Description> {
        let mut stack: Vec<_> = self.ancestors().map(|frame| frame.description()).collect();
        stack.reverse();
        stack
    }

    /// Time from `start()` until this call was entered
    #[must_use]
    pub fn started_at(&self) -> Duration {
        self.calls.arena.get(self.id).pushed_at.saturating_duration_since(self.calls.started_at)
    }
}

impl PartialEq for ProfilerFrame<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.calls, other.calls) && self.id == other.id
    }
}

impl Eq for ProfilerFrame<'_> {}

impl fmt::Debug for ProfilerFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilerFrame")
            .field("description", &self.description().as_str())
            .field("duration", &self.duration())
            .field("parent", &self.parent().map(|p| p.description().as_str()))
            .finish()
    }
}

/// Iterator returned by [`ProfilerFrame::ancestors`]
pub struct Ancestors<'a> {
    next: Option<ProfilerFrame<'a>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = ProfilerFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

impl FusedIterator for Ancestors<'_> {}
