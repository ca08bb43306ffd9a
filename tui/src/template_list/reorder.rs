//! Drag-to-reorder state machine for a flat ordered list.
//!
//! A gesture runs `Idle → Dragging → Persisting → Idle`. Dropping applies the move locally
//! (array move plus contiguous renumbering) and hands back a [`ReorderRequest`] for the store.
//! The caller reports the store's answer through [`ReorderableList::commit`] or
//! [`ReorderableList::rollback`]. While a request is in flight new drags are refused.

use studio_protocol::ordering::Ordered;
use studio_protocol::ordering::move_by_id;
use studio_protocol::ordering::position_of;
use studio_protocol::ordering::sort_by_order;

use super::optimistic::Optimistic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// `from` is the picked-up row, `over` the row it would land on.
    Dragging {
        from: usize,
        over: usize,
    },
    Persisting,
}

/// How an in-flight reorder ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    Committed,
    RolledBack,
}

/// Ids in their new order, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest<Id> {
    pub ordered_ids: Vec<Id>,
}

#[derive(Debug, Clone)]
pub struct ReorderableList<T: Ordered + Clone> {
    items: Optimistic<Vec<T>>,
    phase: DragPhase,
}

impl<T: Ordered + Clone> ReorderableList<T> {
    pub fn new(mut items: Vec<T>) -> Self {
        sort_by_order(&mut items);
        Self {
            items: Optimistic::new(items),
            phase: DragPhase::Idle,
        }
    }

    pub fn items(&self) -> &[T] {
        self.items.get()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == DragPhase::Persisting
    }

    /// Swap in a fresh list from the store. Refused while a reorder is persisting.
    pub fn replace_items(&mut self, mut items: Vec<T>) -> bool {
        if self.is_busy() {
            return false;
        }
        sort_by_order(&mut items);
        if let DragPhase::Dragging { .. } = self.phase {
            self.phase = DragPhase::Idle;
        }
        self.items.replace(items)
    }

    pub fn begin_drag(&mut self, index: usize) -> bool {
        if self.phase != DragPhase::Idle || index >= self.len() {
            return false;
        }
        self.phase = DragPhase::Dragging {
            from: index,
            over: index,
        };
        true
    }

    /// Move the drop target. The index is clamped to the list.
    pub fn drag_over(&mut self, index: usize) -> bool {
        let DragPhase::Dragging { from, over } = self.phase else {
            return false;
        };
        let index = index.min(self.len().saturating_sub(1));
        if index == over {
            return false;
        }
        self.phase = DragPhase::Dragging { from, over: index };
        true
    }

    pub fn cancel_drag(&mut self) -> bool {
        if let DragPhase::Dragging { .. } = self.phase {
            self.phase = DragPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Drop the dragged row on its current target.
    pub fn drop_dragged(&mut self) -> Option<ReorderRequest<T::Id>> {
        let DragPhase::Dragging { from, over } = self.phase else {
            return None;
        };
        let ids = (
            self.items().get(from).map(|item| item.id().clone()),
            self.items().get(over).map(|item| item.id().clone()),
        );
        self.phase = DragPhase::Idle;
        match ids {
            (Some(source), Some(target)) => self.on_drag_end(&source, &target),
            _ => None,
        }
    }

    /// Move `source` into `target`'s slot and apply the result optimistically.
    ///
    /// Returns `None` (no state change) when the ids are equal or unknown, or while a previous
    /// reorder is still persisting.
    pub fn on_drag_end(
        &mut self,
        source: &T::Id,
        target: &T::Id,
    ) -> Option<ReorderRequest<T::Id>> {
        if self.is_busy() {
            tracing::debug!("ignoring drop while a reorder is persisting");
            return None;
        }
        self.phase = DragPhase::Idle;
        if !self.items.apply(|items| move_by_id(items, source, target)) {
            return None;
        }
        self.phase = DragPhase::Persisting;
        Some(ReorderRequest {
            ordered_ids: self.items().iter().map(|item| item.id().clone()).collect(),
        })
    }

    /// The store accepted the reorder.
    pub fn commit(&mut self) -> Option<ReorderOutcome> {
        if !self.is_busy() {
            return None;
        }
        self.items.commit();
        self.phase = DragPhase::Idle;
        Some(ReorderOutcome::Committed)
    }

    /// The store rejected the reorder; restore the pre-drag list exactly.
    pub fn rollback(&mut self) -> Option<ReorderOutcome> {
        if !self.is_busy() {
            return None;
        }
        self.items.rollback();
        self.phase = DragPhase::Idle;
        Some(ReorderOutcome::RolledBack)
    }

    /// Rows in the order they would have if the current drag were dropped now.
    pub fn preview(&self) -> Vec<&T> {
        let mut rows: Vec<&T> = self.items().iter().collect();
        if let DragPhase::Dragging { from, over } = self.phase
            && from < rows.len()
            && over < rows.len()
        {
            let row = rows.remove(from);
            rows.insert(over, row);
        }
        rows
    }

    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        position_of(self.items(), id)
    }
}
