// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::{Affine, Point};

use coppice_ident::{ColorKey, LeafRegistry, RegisterError};
use coppice_imaging::Surface;

use crate::branch::{AddShapeError, Branch};
use crate::leaf::{Leaf, LeafKind};
use crate::stats::{BranchStatistics, Clock, StatsSnapshot, TreeStatistics};
use crate::Mode;

/// The scene: branches, the registry arena, and per-frame bookkeeping.
///
/// A tree owns everything the editor displays — the identity registry
/// that owns the leaves, the branches that order them, the draw-depth
/// budget, the interaction mode, and the rolling render statistics. It is
/// constructed explicitly and passed by reference to whatever needs it
/// (render loop, input handling, editors); there is no ambient global.
///
/// The current version holds a single branch; the operations are written
/// over the branch list so additional independent branches remain a data
/// change, not a redesign.
#[derive(Clone, Debug)]
pub struct Tree {
    registry: LeafRegistry<Leaf>,
    branches: Vec<Branch>,
    draw_depth: u32,
    mode: Mode,
    stats: TreeStatistics,
}

impl Tree {
    /// Creates a tree with one minimal branch (spawn point only).
    pub fn new(draw_depth: u32) -> Result<Self, RegisterError> {
        Self::build(draw_depth, Branch::new)
    }

    /// Creates a tree with the demo branch composition.
    pub fn sample(draw_depth: u32) -> Result<Self, RegisterError> {
        Self::build(draw_depth, Branch::sample)
    }

    fn build(
        draw_depth: u32,
        make_branch: impl FnOnce(&mut LeafRegistry<Leaf>) -> Result<Branch, RegisterError>,
    ) -> Result<Self, RegisterError> {
        let mut registry = LeafRegistry::new();
        let branch = make_branch(&mut registry)?;
        Ok(Self {
            registry,
            branches: alloc::vec![branch],
            draw_depth,
            mode: Mode::View,
            stats: TreeStatistics::new(),
        })
    }

    /// Number of recursive branch instances drawn per frame.
    #[must_use]
    pub fn draw_depth(&self) -> u32 {
        self.draw_depth
    }

    /// Sets the per-frame recursion budget.
    ///
    /// Zero is valid and draws only the flat shapes. Depths beyond the
    /// identity encoding's 10-bit field still render, but instances past
    /// depth 1023 alias earlier depths in the pick buffer.
    pub fn set_draw_depth(&mut self, depth: u32) {
        self.draw_depth = depth;
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the interaction mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Flips between view and edit mode.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            Mode::View => Mode::Edit,
            Mode::Edit => Mode::View,
        };
    }

    /// The branches, in draw order.
    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The (currently singular) editable branch.
    #[must_use]
    pub fn branch(&self) -> &Branch {
        &self.branches[0]
    }

    /// The registry arena owning all leaves.
    #[must_use]
    pub fn registry(&self) -> &LeafRegistry<Leaf> {
        &self.registry
    }

    /// Mutable access to the registry arena.
    pub fn registry_mut(&mut self) -> &mut LeafRegistry<Leaf> {
        &mut self.registry
    }

    /// Shorthand for looking up a leaf by key.
    #[must_use]
    pub fn leaf(&self, key: ColorKey) -> Option<&Leaf> {
        self.registry.get(key)
    }

    /// Shorthand for mutable leaf lookup.
    pub fn leaf_mut(&mut self, key: ColorKey) -> Option<&mut Leaf> {
        self.registry.get_mut(key)
    }

    /// The spawn point's transform, for building depth-chained frames.
    #[must_use]
    pub fn spawn_transform(&self) -> Affine {
        self.branches[0].spawn_transform(&self.registry)
    }

    /// Renders one frame into both surfaces.
    ///
    /// The identity buffer is written only in [`Mode::Edit`]; in view
    /// mode it is left untouched (stale pick data is fine because picking
    /// is an edit-mode interaction).
    ///
    /// Returns this frame's branch statistics; the rolling windows are
    /// updated as a side effect and read via [`Tree::statistics`].
    pub fn draw(
        &mut self,
        visible: &mut dyn Surface,
        identity: &mut dyn Surface,
        clock: &dyn Clock,
    ) -> BranchStatistics {
        let start = clock.now_micros();
        let mut frame = BranchStatistics::new();

        let edit = self.mode == Mode::Edit;
        for branch in &self.branches {
            let identity_target: Option<&mut dyn Surface> = edit.then_some(&mut *identity);
            branch.draw(
                &self.registry,
                visible,
                identity_target,
                self.draw_depth,
                &mut frame,
                clock,
            );
        }

        let elapsed = clock.now_micros().saturating_sub(start);
        self.stats.record(elapsed, &frame);
        frame
    }

    /// Averaged rolling statistics for the status display.
    #[must_use]
    pub fn statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Clears the selection flag across all branches.
    pub fn deselect_all(&mut self) {
        for branch in &self.branches {
            branch.deselect_all(&mut self.registry);
        }
    }

    /// Adds a shape to the editable branch. See [`Branch::add_shape`].
    pub fn add_shape(
        &mut self,
        kind: LeafKind,
        world_position: Point,
        view_scale: f64,
    ) -> Result<ColorKey, AddShapeError> {
        self.branches[0].add_shape(&mut self.registry, kind, world_position, view_scale)
    }

    /// Deletes a leaf from the editable branch. See [`Branch::delete`].
    pub fn delete_leaf(&mut self, key: ColorKey) -> bool {
        self.branches[0].delete(&mut self.registry, key)
    }
}
