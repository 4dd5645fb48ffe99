//! Frame arena: storage for activations and the records they become
//!
//! Every call gets one slot, appended in call order and never reused. A slot
//! starts as an in-flight activation (no end timestamp) and is promoted in
//! place when its call returns. Children refer to their parent by slot index,
//! so a parent that completes after its children were recorded is visible to
//! them without rewriting anything.
//!
//! ```text
//! slot:    0 root   1 a      2 b      3 c
//! parent:  -        0        1        0
//! ended:   open     t=9      t=5      t=12     ← b promoted before a,
//!                                                 b.parent still resolves to a
//! ```

use std::sync::Arc;

use crate::description::Description;
use crate::domain::{Duration, Timestamp};

/// Index of a slot in a [`FrameArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FrameId(pub(crate) usize);

/// One call, in flight or completed
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) description: Arc<Description>,
    pub(crate) pushed_at: Timestamp,
    /// `None` while the call is still active
    pub(crate) popped_at: Option<Timestamp>,
    pub(crate) parent: Option<FrameId>,
}

impl Slot {
    /// Elapsed time; zero for a slot that never ended
    pub(crate) fn duration(&self) -> Duration {
        self.popped_at.map_or(Duration::ZERO, |end| end.saturating_duration_since(self.pushed_at))
    }
}

#[derive(Debug, Default)]
pub(crate) struct FrameArena {
    slots: Vec<Slot>,
}

impl FrameArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity) }
    }

    /// Append an in-flight activation
    pub(crate) fn activate(
        &mut self,
        description: Arc<Description>,
        pushed_at: Timestamp,
        parent: Option<FrameId>,
    ) -> FrameId {
        let id = FrameId(self.slots.len());
        self.slots.push(Slot { description, pushed_at, popped_at: None, parent });
        id
    }

    /// Fix the end of an activation, turning it into a completed record
    pub(crate) fn promote(&mut self, id: FrameId, popped_at: Timestamp) {
        let slot = &mut self.slots[id.0];
        debug_assert!(slot.popped_at.is_none(), "frame {id:?} promoted twice");
        // Same-clock readings are ordered; the max guards hosts feeding
        // timestamps of their own.
        slot.popped_at = Some(popped_at.max(slot.pushed_at));
    }

    /// Close abandoned activations at `at` without recording them
    pub(crate) fn seal(&mut self, ids: &[FrameId], at: Timestamp) {
        for id in ids {
            let slot = &mut self.slots[id.0];
            if slot.popped_at.is_none() {
                slot.popped_at = Some(at.max(slot.pushed_at));
            }
        }
    }

    pub(crate) fn get(&self, id: FrameId) -> &Slot {
        &self.slots[id.0]
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
