// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `Free`/`InUse` bookkeeping for a fixed pool of drawing buffers.
//!
//! The pool trades a small fixed amount of memory (2–3 buffers in practice)
//! for the guarantee that drawing never waits on the compositor. [`acquire`]
//! never blocks: when every slot is `InUse` it returns [`None`] and the caller
//! skips the draw for this cycle instead of stalling the reactor.
//!
//! The state machine is the real correctness constraint, not a lock: a slot
//! handed out for drawing stays `InUse` until the presentation layer observes
//! the compositor's release event and calls [`release`]. A buffer is never
//! reused while a prior presentation of it might still be read.
//!
//! Slot payloads are opaque to this module; the Wayland backend stores its
//! shared-memory buffer handles here.
//!
//! [`acquire`]: BufferPool::acquire
//! [`release`]: BufferPool::release

/// Identifies one slot in a [`BufferPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Slot index within the pool.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Free,
    InUse,
}

#[derive(Debug)]
struct Slot<B> {
    payload: B,
    state: SlotState,
}

/// Fixed-size buffer pool with non-blocking acquisition.
#[derive(Debug)]
pub struct BufferPool<B> {
    slots: Vec<Slot<B>>,
}

impl<B> BufferPool<B> {
    /// Builds a pool whose slot payloads are produced by `build`, called once
    /// per slot with the [`SlotId`] the payload will live under.
    pub fn from_fn(count: usize, mut build: impl FnMut(SlotId) -> B) -> Self {
        let slots = (0..count)
            .map(|index| Slot {
                payload: build(SlotId(index)),
                state: SlotState::Free,
            })
            .collect();
        Self { slots }
    }

    /// Claims a `Free` slot and marks it `InUse`.
    ///
    /// Returns [`None`] when the pool is exhausted; callers must treat that
    /// as "skip this draw", never as a reason to wait.
    pub fn acquire(&mut self) -> Option<SlotId> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.state == SlotState::Free)?;
        self.slots[index].state = SlotState::InUse;
        Some(SlotId(index))
    }

    /// Returns a slot to `Free` after the compositor confirmed it is no
    /// longer reading it.
    ///
    /// Returns false if the slot id is unknown or the slot was already free,
    /// which indicates a release-protocol bug in the caller.
    pub fn release(&mut self, id: SlotId) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.state == SlotState::InUse => {
                slot.state = SlotState::Free;
                true
            }
            _ => false,
        }
    }

    /// Payload access for a slot, typically while drawing into it.
    #[must_use]
    pub fn payload(&self, id: SlotId) -> Option<&B> {
        self.slots.get(id.index()).map(|slot| &slot.payload)
    }

    /// Mutable payload access for a slot.
    pub fn payload_mut(&mut self, id: SlotId) -> Option<&mut B> {
        self.slots.get_mut(id.index()).map(|slot| &mut slot.payload)
    }

    /// Total slot count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has zero slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently `Free`.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Free)
            .count()
    }
}
