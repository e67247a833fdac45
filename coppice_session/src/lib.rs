// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Session: selection and coordinate-mapping state for editing.
//!
//! Thousands of recursive instances can be on screen while only one leaf
//! list exists, so "what is selected" is a *pair*: the leaf's identity
//! key plus the recursion depth of the clicked instance. This crate
//! tracks that pair and the transform arithmetic it implies:
//!
//! - [`Session::resolve_click`] samples the identity buffer through the
//!   [`PixelSource`] seam and resolves the pixel to a `(key, depth)` pair
//!   via the registry. Background clicks are a plain miss.
//! - Selecting caches the **cumulative branch transform** — the spawn
//!   point's transform self-composed `depth` times — which situates the
//!   selected instance's branch frame in world space. The cache is
//!   recomputed on every selection change (O(depth), bounded by the
//!   10-bit depth field) and is the identity when nothing is selected.
//! - [`Session::map_world_to_branch`] applies the cached inverse, which
//!   is what lets a drag delta measured in world space be re-expressed in
//!   the coordinate frame of whichever recursive copy is being dragged,
//!   even though that copy's geometry is never separately stored.
//! - [`DragState`] is the pointer-tracking half: start/update/end with
//!   per-move deltas, and [`Session::drag_to`] composes the two so the
//!   caller receives deltas already in branch space.
//!
//! ## Selection scope
//!
//! The *display* flag lives on the leaf and is shared by all of its
//! recursive instances: selecting one copy highlights every copy. That is
//! deliberate — the copies share geometry, and an edit to one edits all —
//! but the session still remembers which depth was clicked, because the
//! transform math above depends on it. Scoping the highlight to a single
//! `(leaf, depth)` instance would only require moving the flag into this
//! session, should the editor ever want that.
//!
//! The session holds no references into the scene: just the key, the
//! depth, and cached transforms. The registry is passed in where needed.
//!
//! This crate is `no_std`.

#![no_std]

mod drag;

pub use drag::DragState;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Vec2};

use coppice_ident::{ColorKey, LeafRegistry};
use coppice_imaging::PixelSource;
use coppice_transform::{is_invertible, self_compose};

/// Selection and coordinate-mapping session state.
///
/// One instance lives per running scene, mutated by every selection or
/// drag event. See the crate docs for the model.
#[derive(Clone, Debug, Default)]
pub struct Session {
    selected: Option<(ColorKey, u32)>,
    branch_transform: Affine,
    inverse_branch_transform: Affine,
    drag: DragState,
}

impl Session {
    /// Creates a session with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            selected: None,
            branch_transform: Affine::IDENTITY,
            inverse_branch_transform: Affine::IDENTITY,
            drag: DragState::default(),
        }
    }

    /// The selected `(leaf key, depth)` pair, if any.
    #[must_use]
    pub fn selected(&self) -> Option<(ColorKey, u32)> {
        self.selected
    }

    /// The cached cumulative branch transform of the selected instance.
    ///
    /// Identity when nothing is selected or the selected depth is 0.
    #[must_use]
    pub fn branch_transform(&self) -> Affine {
        self.branch_transform
    }

    /// Sets (or clears) the selection and recomputes the cached
    /// transforms.
    ///
    /// `spawn_transform` is the spawn point's current local transform;
    /// the cumulative transform is that matrix self-composed `depth`
    /// times. Callers pass it on every change because the spawn point
    /// itself is editable — a stale cache would drag the selection
    /// through last frame's fractal.
    pub fn set_selected(&mut self, selection: Option<(ColorKey, u32)>, spawn_transform: Affine) {
        self.selected = selection;
        self.branch_transform = match selection {
            Some((_, depth)) => self_compose(spawn_transform, depth),
            None => Affine::IDENTITY,
        };
        // The spawn transform is kept invertible by the leaf's edit gate,
        // and powers of an invertible matrix stay invertible; the guard
        // covers a degenerate registry state rather than normal use.
        self.inverse_branch_transform = if is_invertible(self.branch_transform) {
            self.branch_transform.inverse()
        } else {
            Affine::IDENTITY
        };
    }

    /// Resolves a device-space click into a `(key, depth)` pair.
    ///
    /// Samples the identity buffer at the pixel containing `position` and
    /// looks the color up in the registry. Returns `None` for background,
    /// stale, or out-of-bounds pixels — the ordinary result of clicking
    /// empty canvas.
    ///
    /// This only *resolves*; call [`Session::set_selected`] with the
    /// result (and the current spawn transform) to commit it.
    #[must_use]
    pub fn resolve_click<T>(
        &self,
        identity: &impl PixelSource,
        position: Point,
        registry: &LeafRegistry<T>,
    ) -> Option<(ColorKey, u32)> {
        let in_range = |v: f64| v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX);
        let x = position.x.floor();
        let y = position.y.floor();
        if !in_range(x) || !in_range(y) {
            return None;
        }
        let rgb = identity.rgb24_at(x as i32, y as i32)?;
        registry.lookup(rgb)
    }

    /// Maps a world-space point into the selected instance's branch frame.
    #[must_use]
    pub fn map_world_to_branch(&self, point: Point) -> Point {
        self.inverse_branch_transform * point
    }

    /// Maps a branch-frame point of the selected instance to world space.
    #[must_use]
    pub fn map_branch_to_world(&self, point: Point) -> Point {
        self.branch_transform * point
    }

    /// Begins a drag at a world-space pointer position.
    pub fn begin_drag(&mut self, position: Point) {
        self.drag.start(position);
    }

    /// Continues a drag, returning the movement delta since the last
    /// update, expressed in the selected instance's branch frame.
    ///
    /// Returns `None` when no drag is active. The delta is computed as
    /// the difference of the two mapped endpoints, so it is exact under
    /// rotation and non-uniform scale, not just translation.
    pub fn drag_to(&mut self, position: Point) -> Option<Vec2> {
        let previous = self.drag.last_position()?;
        self.drag.update(position)?;
        Some(self.map_world_to_branch(position) - self.map_world_to_branch(previous))
    }

    /// Ends the active drag, if any.
    pub fn end_drag(&mut self) {
        self.drag.end();
    }

    /// Returns `true` while a drag is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coppice_ident::LeafRegistry;

    fn spawn_t() -> Affine {
        Affine::translate((60.0, 0.0))
            * Affine::rotate((-10.0_f64).to_radians())
            * Affine::scale_non_uniform(0.98, 0.98)
    }

    fn key() -> (LeafRegistry<()>, ColorKey) {
        let mut registry = LeafRegistry::new();
        let key = registry.register(()).expect("fresh registry");
        (registry, key)
    }

    #[test]
    fn empty_session_maps_identically() {
        let session = Session::new();
        assert_eq!(session.selected(), None);
        let p = Point::new(12.0, -7.0);
        assert_eq!(session.map_world_to_branch(p), p);
        assert_eq!(session.map_branch_to_world(p), p);
    }

    #[test]
    fn selection_at_depth_zero_keeps_identity_transform() {
        let (_registry, key) = key();
        let mut session = Session::new();
        session.set_selected(Some((key, 0)), spawn_t());
        assert_eq!(session.branch_transform(), Affine::IDENTITY);
    }

    #[test]
    fn selection_caches_depth_power_of_spawn_transform() {
        let (_registry, key) = key();
        let mut session = Session::new();
        session.set_selected(Some((key, 3)), spawn_t());

        let expected = spawn_t() * spawn_t() * spawn_t();
        let (a, b) = (
            session.branch_transform().as_coeffs(),
            expected.as_coeffs(),
        );
        for i in 0..6 {
            assert!((a[i] - b[i]).abs() < 1e-12, "coefficient {i} differs");
        }
    }

    #[test]
    fn world_branch_round_trip_at_depth() {
        let (_registry, key) = key();
        let mut session = Session::new();
        session.set_selected(Some((key, 2)), spawn_t());

        let world = Point::new(100.0, -40.0);
        let branch = session.map_world_to_branch(world);
        let back = session.map_branch_to_world(branch);
        assert!((back - world).hypot() < 1e-9);
        assert!((branch - world).hypot() > 1.0, "depth 2 is a real remap");
    }

    #[test]
    fn clearing_selection_resets_the_cache() {
        let (_registry, key) = key();
        let mut session = Session::new();
        session.set_selected(Some((key, 5)), spawn_t());
        session.set_selected(None, spawn_t());
        assert_eq!(session.branch_transform(), Affine::IDENTITY);
    }

    #[test]
    fn drag_deltas_are_expressed_in_branch_space() {
        let (_registry, key) = key();
        let mut session = Session::new();
        // Pure doubling: world deltas arrive halved in branch space.
        session.set_selected(Some((key, 1)), Affine::scale(2.0));

        session.begin_drag(Point::new(10.0, 10.0));
        let delta = session.drag_to(Point::new(14.0, 10.0)).expect("dragging");
        assert!((delta.x - 2.0).abs() < 1e-12);
        assert!(delta.y.abs() < 1e-12);

        // Deltas accumulate per move, not from the start position.
        let delta = session.drag_to(Point::new(14.0, 16.0)).expect("dragging");
        assert!((delta.y - 3.0).abs() < 1e-12);

        session.end_drag();
        assert_eq!(session.drag_to(Point::new(0.0, 0.0)), None);
    }
}
