//! Fixed-capacity circular store of network frames.
//!
//! Every slot is allocated up front and reused forever. Writers always win:
//! allocating while the buffer is full silently drops the oldest unread
//! frame. All state lives behind one `critical-section` mutex, and every
//! method holds it only long enough to copy pixels in or out.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::frame::{Frame, Timestamp};
use crate::wire::{self, DecodeError};

/// Reference to one slot of a [`FrameRingBuffer`].
///
/// Handles carry the sequence number the slot had when the handle was made,
/// so a handle to a slot that has since been rewritten is detected as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle {
    slot: usize,
    sequence: u32,
}

impl FrameHandle {
    pub const fn slot(self) -> usize {
        self.slot
    }

    pub const fn sequence(self) -> u32 {
        self.sequence
    }
}

struct RingState<const SLOTS: usize, const MAX_PIXELS: usize> {
    slots: [Frame<MAX_PIXELS>; SLOTS],
    /// Cleared on allocation, set once the writer has filled the slot
    written: [bool; SLOTS],
    sequences: [u32; SLOTS],
    next_sequence: u32,
    /// Next slot to write
    head: usize,
    /// Oldest unread slot
    tail: usize,
    /// Unread frames; disambiguates full from empty when `head == tail`
    len: usize,
    newest: Option<usize>,
}

impl<const SLOTS: usize, const MAX_PIXELS: usize> RingState<SLOTS, MAX_PIXELS> {
    const fn new() -> Self {
        Self {
            slots: [const { Frame::new() }; SLOTS],
            written: [false; SLOTS],
            sequences: [0; SLOTS],
            next_sequence: 1,
            head: 0,
            tail: 0,
            len: 0,
            newest: None,
        }
    }

    fn handle(&self, slot: usize) -> FrameHandle {
        FrameHandle {
            slot,
            sequence: self.sequences[slot],
        }
    }

    fn is_current(&self, handle: FrameHandle) -> bool {
        handle.slot < SLOTS && self.sequences[handle.slot] == handle.sequence
    }

    fn allocate(&mut self) -> usize {
        let slot = self.head;
        self.head = (self.head + 1) % SLOTS;
        if self.len == SLOTS {
            // Full: the slot we are about to reuse is the oldest unread frame
            self.tail = (self.tail + 1) % SLOTS;
        } else {
            self.len += 1;
        }

        self.sequences[slot] = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.newest = Some(slot);
        // Whatever the slot held before is gone, even if the write is late
        self.slots[slot].reset();
        self.written[slot] = false;
        slot
    }

    /// Oldest unread slot, if its writer has finished
    fn oldest(&self) -> Option<usize> {
        (self.len > 0 && self.written[self.tail]).then_some(self.tail)
    }

    /// Newest slot, if its writer has finished
    fn newest(&self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.newest.filter(|&slot| self.written[slot])
    }

    fn retire_oldest(&mut self) -> Option<usize> {
        let slot = self.oldest()?;
        self.tail = (self.tail + 1) % SLOTS;
        self.len -= 1;
        Some(slot)
    }
}

/// Circular buffer of `SLOTS` frames, each holding up to `MAX_PIXELS` pixels.
pub struct FrameRingBuffer<const SLOTS: usize, const MAX_PIXELS: usize> {
    inner: Mutex<RefCell<RingState<SLOTS, MAX_PIXELS>>>,
}

impl<const SLOTS: usize, const MAX_PIXELS: usize> FrameRingBuffer<SLOTS, MAX_PIXELS> {
    /// Create an empty buffer with every slot pre-allocated.
    pub const fn new() -> Self {
        const { assert!(SLOTS > 0, "frame ring needs at least one slot") };
        Self {
            inner: Mutex::new(RefCell::new(RingState::new())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RingState<SLOTS, MAX_PIXELS>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Fixed number of slots
    pub const fn capacity(&self) -> usize {
        SLOTS
    }

    /// Number of unread frames
    pub fn depth(&self) -> usize {
        self.with_state(|state| state.len)
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    pub fn is_full(&self) -> bool {
        self.depth() == SLOTS
    }

    /// Claim the next slot in write order.
    ///
    /// If the buffer was full the oldest unread frame is dropped. The slot is
    /// emptied and stays pending until written through [`Self::write`]:
    /// readers stop at it instead of seeing a half-written or stale frame.
    pub fn allocate_for_write(&self) -> FrameHandle {
        self.with_state(|state| {
            let slot = state.allocate();
            state.handle(slot)
        })
    }

    /// Mutate the frame behind `handle`.
    ///
    /// Returns `None` if the slot was reused since the handle was issued.
    pub fn write<R>(
        &self,
        handle: FrameHandle,
        f: impl FnOnce(&mut Frame<MAX_PIXELS>) -> R,
    ) -> Option<R> {
        let result = self.with_state(|state| {
            if !state.is_current(handle) {
                return None;
            }
            let result = f(&mut state.slots[handle.slot]);
            state.written[handle.slot] = true;
            Some(result)
        });
        if result.is_none() {
            log::warn!("write to stale frame handle (slot {})", handle.slot);
        }
        result
    }

    /// Copy `frame` into the next slot
    pub fn push(&self, frame: &Frame<MAX_PIXELS>) -> FrameHandle {
        self.with_state(|state| {
            let slot = state.allocate();
            state.slots[slot].copy_from(frame);
            state.written[slot] = true;
            state.handle(slot)
        })
    }

    /// Validate a raw packet and store it in the next slot.
    ///
    /// A packet that fails validation never claims a slot, so malformed
    /// input cannot push out good frames.
    pub fn push_wire(&self, bytes: &[u8]) -> Result<FrameHandle, DecodeError> {
        let packet = wire::validate(bytes, MAX_PIXELS).inspect_err(|err| {
            log::warn!("dropping network packet: {}", err);
        })?;

        Ok(self.with_state(|state| {
            let slot = state.allocate();
            state.slots[slot].fill_packed(
                packet.pixel_bytes,
                packet.header.timestamp,
                packet.header.channel,
            );
            state.written[slot] = true;
            state.handle(slot)
        }))
    }

    /// Most recently written frame, without consuming it
    pub fn peek_newest(&self) -> Option<FrameHandle> {
        self.with_state(|state| state.newest().map(|slot| state.handle(slot)))
    }

    /// Oldest unread frame, without consuming it
    pub fn peek_oldest(&self) -> Option<FrameHandle> {
        self.with_state(|state| state.oldest().map(|slot| state.handle(slot)))
    }

    /// Retire the oldest unread frame and return a handle to it.
    ///
    /// The handle stays readable until the slot is reused by a writer.
    pub fn consume_oldest(&self) -> Option<FrameHandle> {
        self.with_state(|state| state.retire_oldest().map(|slot| state.handle(slot)))
    }

    /// The `index`-th unread frame, counting from the oldest
    pub fn get(&self, index: usize) -> Option<FrameHandle> {
        self.with_state(|state| {
            if index >= state.len {
                return None;
            }
            Some(state.handle((state.tail + index) % SLOTS))
        })
    }

    /// Read the frame behind `handle`.
    ///
    /// `None` if the handle is stale or its slot has not been written yet.
    pub fn with_frame<R>(
        &self,
        handle: FrameHandle,
        f: impl FnOnce(&Frame<MAX_PIXELS>) -> R,
    ) -> Option<R> {
        self.with_state(|state| {
            (state.is_current(handle) && state.written[handle.slot])
                .then(|| f(&state.slots[handle.slot]))
        })
    }

    /// Copy the frame behind `handle` into `out`
    pub fn copy_frame(&self, handle: FrameHandle, out: &mut Frame<MAX_PIXELS>) -> bool {
        self.with_frame(handle, |frame| out.copy_from(frame)).is_some()
    }

    /// Capture time of the frame behind `handle`
    pub fn timestamp(&self, handle: FrameHandle) -> Option<Timestamp> {
        self.with_frame(handle, Frame::captured_at)
    }

    /// Copy the oldest unread frame into `out`, mark its slot drawn and
    /// retire it.
    pub fn take_oldest_into(&self, out: &mut Frame<MAX_PIXELS>) -> bool {
        self.with_state(|state| {
            let Some(slot) = state.retire_oldest() else {
                return false;
            };
            out.copy_from(&state.slots[slot]);
            state.slots[slot].mark_drawn();
            true
        })
    }

    /// Copy the newest frame that is due at `now` into `out`.
    ///
    /// Every due frame older than it is retired unseen, since showing it
    /// would only put the display further behind. Frames still in the
    /// future stay queued. Returns the number of skipped frames when a frame
    /// was taken.
    pub fn take_due_into(&self, now: Timestamp, out: &mut Frame<MAX_PIXELS>) -> Option<usize> {
        self.with_state(|state| {
            let mut taken = None;
            let mut skipped = 0;
            while let Some(slot) = state.oldest() {
                if now.is_older_than(state.slots[slot].captured_at()) {
                    break;
                }
                if taken.replace(slot).is_some() {
                    skipped += 1;
                }
                state.retire_oldest();
            }

            let slot = taken?;
            out.copy_from(&state.slots[slot]);
            state.slots[slot].mark_drawn();
            Some(skipped)
        })
    }

    /// `captured_at - now` of the oldest unread frame in seconds; 0 when empty
    pub fn age_of_oldest(&self, now: Timestamp) -> f64 {
        self.with_state(|state| {
            state
                .oldest()
                .map_or(0.0, |slot| state.slots[slot].captured_at().seconds_from(now))
        })
    }

    /// `captured_at - now` of the newest frame in seconds; 0 when empty
    pub fn age_of_newest(&self, now: Timestamp) -> f64 {
        self.with_state(|state| {
            state
                .newest()
                .map_or(0.0, |slot| state.slots[slot].captured_at().seconds_from(now))
        })
    }

    /// Drop every unread frame
    pub fn clear(&self) {
        self.with_state(|state| {
            state.tail = state.head;
            state.len = 0;
            state.newest = None;
        });
    }
}

impl<const SLOTS: usize, const MAX_PIXELS: usize> Default for FrameRingBuffer<SLOTS, MAX_PIXELS> {
    fn default() -> Self {
        Self::new()
    }
}
