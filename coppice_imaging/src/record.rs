// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use coppice_transform::TransformStack;

use crate::{Affine, DrawOp, StateOp, Surface};

/// Operation recorded by [`RecordSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedOp {
    /// A state operation.
    State(StateOp),
    /// A draw operation.
    Draw(DrawOp),
}

/// Event recorded by [`RecordSurface`]: the operation plus the composed
/// transform that was current when it was applied.
///
/// For a draw event, `transform` is the frame the geometry was drawn in;
/// applying it to the op's local coordinates gives device positions. For
/// a state event it is the transform *after* the op took effect.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordEvent {
    /// The recorded operation.
    pub op: RecordedOp,
    /// Composed transform at apply time.
    pub transform: Affine,
}

/// A [`Surface`] that records operations instead of rendering.
///
/// This backend rasterizes nothing; it maintains the transform stack and
/// logs every operation with the transform current at apply time. Tests
/// assert on the log to check *what* was drawn and *where* — e.g. that the
/// spawn-point marker of a depth-3 tree appears under three distinct
/// composed frames — without needing pixels.
#[derive(Clone, Debug, Default)]
pub struct RecordSurface {
    stack: TransformStack,
    events: Vec<RecordEvent>,
}

impl RecordSurface {
    /// Creates an empty recording surface with an identity base frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in application order.
    #[must_use]
    pub fn events(&self) -> &[RecordEvent] {
        &self.events
    }

    /// Returns the recorded draw events only, with their transforms.
    pub fn draw_events(&self) -> impl Iterator<Item = (&DrawOp, Affine)> {
        self.events.iter().filter_map(|event| match &event.op {
            RecordedOp::Draw(op) => Some((op, event.transform)),
            RecordedOp::State(_) => None,
        })
    }

    /// Clears the event log; the transform stack is reset to its base.
    pub fn clear(&mut self) {
        self.events.clear();
        self.stack.reset();
    }
}

impl Surface for RecordSurface {
    fn state(&mut self, op: StateOp) {
        match &op {
            StateOp::PushTransform(local) => self.stack.push(*local),
            StateOp::PopTransform => {
                self.stack.pop();
            }
            StateOp::SetFill(_) | StateOp::SetStroke { .. } => {}
        }
        self.events.push(RecordEvent {
            op: RecordedOp::State(op),
            transform: self.stack.current(),
        });
    }

    fn draw(&mut self, op: DrawOp) {
        self.events.push(RecordEvent {
            op: RecordedOp::Draw(op),
            transform: self.stack.current(),
        });
    }

    fn transform(&self) -> Affine {
        self.stack.current()
    }
}
