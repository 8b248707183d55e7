//! Depth-First Walk Plumbing
//!
//! The renumbering walk in [`crate::tree::TreeStore::insert`] is driven by a
//! plain LIFO stack of tagged events. An `Enter` event is the first visit to
//! a node (assigns its new left bound); an `Exit` event closes the node's
//! interval (assigns its new right bound). Making the tag an explicit enum
//! keeps the traversal exhaustively matchable.

use crate::models::Node;

/// One step of the renumbering walk.
#[derive(Debug, Clone)]
pub enum WalkEvent {
    /// First visit: the node's left bound is assigned next
    Enter(Node),
    /// Closing visit: the node's right bound is assigned next
    Exit(Node),
}

/// A plain LIFO stack; no ordering guarantee beyond strict last-in-first-out.
///
/// Pure in-memory structure, no I/O. `pop` yields `None` when empty.
#[derive(Debug, Default)]
pub struct IntervalStack<T> {
    items: Vec<T>,
}

impl<T> IntervalStack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
