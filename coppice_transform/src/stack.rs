// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Affine;
use smallvec::SmallVec;

/// An explicit stack of composed affine frames.
///
/// The recursive branch draw needs exactly one discipline: *save* the
/// current frame, *apply* a leaf's local transform, draw (and possibly
/// recurse), then *restore*. Keeping that discipline in a plain data
/// structure — rather than in the push/pop side effects of a particular
/// paint API — lets the same recursion drive any surface backend and
/// makes the contract testable on its own.
///
/// The stack always holds at least one frame (the base, identity unless
/// constructed with [`TransformStack::with_base`]); [`TransformStack::pop`]
/// refuses to remove it.
///
/// Inline storage covers eight pushed frames before spilling to the heap,
/// which comfortably holds typical interactive recursion depths.
#[derive(Clone, Debug)]
pub struct TransformStack {
    frames: SmallVec<[Affine; 8]>,
}

impl TransformStack {
    /// Creates a stack whose base frame is the identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base(Affine::IDENTITY)
    }

    /// Creates a stack whose base frame is `base`.
    ///
    /// Used when drawing starts inside an ambient transform, e.g. the
    /// view's world-to-screen mapping.
    #[must_use]
    pub fn with_base(base: Affine) -> Self {
        let mut frames = SmallVec::new();
        frames.push(base);
        Self { frames }
    }

    /// Returns the current composed frame.
    #[must_use]
    pub fn current(&self) -> Affine {
        *self.frames.last().expect("stack always holds a base frame")
    }

    /// Pushes a new frame: the current frame composed with `local`.
    pub fn push(&mut self, local: Affine) {
        let next = self.current() * local;
        self.frames.push(next);
    }

    /// Pops the most recently pushed frame, restoring the previous one.
    ///
    /// Returns `false` (and does nothing) when only the base frame is
    /// left; an unmatched pop is a caller bug but not a panic.
    pub fn pop(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Number of frames pushed above the base.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Drops all pushed frames, keeping only the base.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}
