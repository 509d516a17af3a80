//! Per-frame render queue.
//!
//! [`RenderQueue`] collects [`RenderCall`]s submitted during a frame together
//! with a [`SortKey`] per call. On flush the keys (not the calls) are sorted
//! and the calls are handed out in `(depth, submission order)` order, after
//! which the queue is emptied for the next frame.
//!
//! Two calls with the same depth always come out in the order they were
//! submitted, so overlapping sprites on one layer keep a stable paint order.
//!
//! # Example
//!
//! ```rust
//! use deferred_render::render::{CallRect, Color, RenderCall, RenderQueue};
//!
//! let mut queue = RenderQueue::new();
//! queue.submit(RenderCall::rect(CallRect::new(0, 0, 8, 8), Color::WHITE, true), 10);
//! queue.submit(RenderCall::rect(CallRect::new(1, 1, 8, 8), Color::BLACK, true), -5);
//!
//! let mut order = Vec::new();
//! queue.flush(|call, depth| order.push((call.dst.x, depth)));
//! assert_eq!(order, vec![(1, -5), (0, 10)]);
//! assert!(queue.is_empty());
//! ```

use crate::render::RenderCall;

/// Number of calls a single frame may hold.
pub const MAX_CALLS_PER_FRAME: usize = u16::MAX as usize + 1;

/// Ordering key: depth first, then insertion index. Field order gives the lexicographic `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub depth: i16,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct RenderQueue {
    /// Calls in submission order. Never reordered.
    calls: Vec<RenderCall>,
    /// One key per call, sorted on flush.
    keys: Vec<SortKey>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `call` at `depth` and returns it for in-place adjustment.
    ///
    /// # Panics
    /// Panics when the frame already holds [`MAX_CALLS_PER_FRAME`] calls. That only happens
    /// when a call site submits without ever flushing.
    pub fn submit(&mut self, call: RenderCall, depth: i16) -> &mut RenderCall {
        let index = self.calls.len();
        assert!(
            index < MAX_CALLS_PER_FRAME,
            "render queue overflow: more than {} calls submitted in one frame",
            MAX_CALLS_PER_FRAME
        );

        self.keys.push(SortKey { depth, index: index as u16 });
        self.calls.push(call);
        &mut self.calls[index]
    }

    /// Sorts the pending calls, hands each one to `exec` and clears the queue.
    pub fn flush<F>(&mut self, mut exec: F)
    where
        F: FnMut(&RenderCall, i16),
    {
        // keys are unique (distinct indices), so an unstable sort is still deterministic
        self.keys.sort_unstable();

        for key in &self.keys {
            exec(&self.calls[key.index as usize], key.depth);
        }

        self.clear();
    }

    /// Drops every pending call without executing it.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CallRect, Color};

    fn tagged(tag: i32) -> RenderCall {
        RenderCall::rect(CallRect::new(tag, 0, 1, 1), Color::WHITE, true)
    }

    fn drain(queue: &mut RenderQueue) -> Vec<(i16, i16)> {
        let mut out = Vec::new();
        queue.flush(|call, depth| out.push((call.dst.x, depth)));
        out
    }

    #[test]
    fn sorts_by_depth_then_submission() {
        let mut queue = RenderQueue::new();
        let depths: [i16; 8] = [5, -3, 5, 0, i16::MIN, -3, i16::MAX, 5];
        for (tag, depth) in depths.iter().enumerate() {
            queue.submit(tagged(tag as i32), *depth);
        }

        let mut expected: Vec<(i16, i16)> = depths.iter().enumerate().map(|(t, d)| (t as i16, *d)).collect();
        expected.sort_by_key(|(tag, depth)| (*depth, *tag));

        assert_eq!(drain(&mut queue), expected);
    }

    #[test]
    fn equal_depth_keeps_submission_order() {
        let mut queue = RenderQueue::new();
        for tag in 0..1000 {
            queue.submit(tagged(tag), 7);
        }
        let tags: Vec<i16> = drain(&mut queue).into_iter().map(|(t, _)| t).collect();
        assert_eq!(tags, (0..1000).collect::<Vec<i16>>());
    }

    #[test]
    fn flush_empties_the_queue() {
        let mut queue = RenderQueue::new();
        queue.submit(tagged(1), 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(drain(&mut queue).len(), 1);
        assert!(queue.is_empty());
        assert!(drain(&mut queue).is_empty());
    }

    #[test]
    fn submit_returns_the_stored_call() {
        let mut queue = RenderQueue::new();
        queue.submit(tagged(1), 0).dst.y = 42;
        let mut seen = None;
        queue.flush(|call, _| seen = Some(call.dst.y));
        assert_eq!(seen, Some(42));
    }

    #[test]
    fn a_full_frame_is_accepted() {
        let mut queue = RenderQueue::new();
        for _ in 0..MAX_CALLS_PER_FRAME {
            queue.submit(tagged(0), 0);
        }
        assert_eq!(queue.len(), MAX_CALLS_PER_FRAME);

        let mut last = None;
        let mut count = 0usize;
        queue.flush(|call, _| {
            count += 1;
            last = Some(*call);
        });
        assert_eq!(count, MAX_CALLS_PER_FRAME);
        assert!(last.is_some());
    }

    #[test]
    #[should_panic(expected = "render queue overflow")]
    fn overflow_is_fatal() {
        let mut queue = RenderQueue::new();
        for _ in 0..=MAX_CALLS_PER_FRAME {
            queue.submit(tagged(0), 0);
        }
    }
}
