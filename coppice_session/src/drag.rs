// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Vec2};

/// Pointer-drag tracking: per-move deltas and the total offset.
///
/// A drag is a start position plus the most recent position. [`update`]
/// returns the movement since the previous update, which is what
/// incremental edits (nudging a transform) consume; [`total_offset`]
/// returns the distance from the start, for gestures that re-derive their
/// state from scratch each move.
///
/// Positions are in whatever space the caller works in (Coppice feeds it
/// world-space pointer positions); the tracker itself is space-agnostic.
///
/// [`update`]: DragState::update
/// [`total_offset`]: DragState::total_offset
#[derive(Clone, Copy, Debug, Default)]
pub struct DragState {
    start: Option<Point>,
    last: Option<Point>,
}

impl DragState {
    /// Begins a drag at `position`.
    pub fn start(&mut self, position: Point) {
        self.start = Some(position);
        self.last = Some(position);
    }

    /// Records a new position, returning the delta since the last one.
    ///
    /// Returns `None` when no drag is active.
    pub fn update(&mut self, position: Point) -> Option<Vec2> {
        let last = self.last?;
        self.last = Some(position);
        Some(position - last)
    }

    /// Offset of `position` from the drag's start, or `None` when idle.
    #[must_use]
    pub fn total_offset(&self, position: Point) -> Option<Vec2> {
        self.start.map(|start| position - start)
    }

    /// The most recent recorded position, or `None` when idle.
    #[must_use]
    pub fn last_position(&self) -> Option<Point> {
        self.last
    }

    /// Ends the drag and clears all state.
    pub fn end(&mut self) {
        self.start = None;
        self.last = None;
    }

    /// Returns `true` while a drag is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_returns_none_everywhere() {
        let mut drag = DragState::default();
        assert!(!drag.is_dragging());
        assert_eq!(drag.update(Point::new(1.0, 1.0)), None);
        assert_eq!(drag.total_offset(Point::new(1.0, 1.0)), None);
        assert_eq!(drag.last_position(), None);
    }

    #[test]
    fn update_yields_per_move_deltas() {
        let mut drag = DragState::default();
        drag.start(Point::new(10.0, 20.0));

        assert_eq!(drag.update(Point::new(15.0, 25.0)), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(drag.update(Point::new(15.0, 22.0)), Some(Vec2::new(0.0, -3.0)));
        assert_eq!(
            drag.total_offset(Point::new(15.0, 22.0)),
            Some(Vec2::new(5.0, 2.0))
        );
    }

    #[test]
    fn end_resets_for_the_next_gesture() {
        let mut drag = DragState::default();
        drag.start(Point::new(0.0, 0.0));
        drag.end();
        assert!(!drag.is_dragging());

        drag.start(Point::new(3.0, 3.0));
        assert_eq!(drag.last_position(), Some(Point::new(3.0, 3.0)));
    }
}
