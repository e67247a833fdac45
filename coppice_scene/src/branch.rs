// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point, Vec2};

use coppice_ident::{ColorKey, LeafRegistry, RegisterError};
use coppice_imaging::{Color, StateOp, Surface};

use crate::leaf::{Geometry, Leaf, LeafKind};
use crate::stats::{BranchStatistics, Clock};

/// Default spawn-point transform for a new branch.
///
/// Steps 60 units right, curls 10 degrees, and shrinks slightly per
/// recursion — a generator that produces a visible, converging spiral out
/// of the box instead of an identity transform that would stack every
/// copy on top of the first.
fn default_spawn_transform() -> Affine {
    Affine::translate((60.0, 0.0))
        * Affine::rotate((-10.0_f64).to_radians())
        * Affine::scale_non_uniform(0.98, 0.98)
}

/// Error returned by [`Branch::add_shape`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddShapeError {
    /// A branch holds exactly one spawn point; adding another is refused.
    SecondSpawnPoint,
    /// The identity registry had no key left for the new leaf.
    Identity(RegisterError),
}

impl fmt::Display for AddShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecondSpawnPoint => write!(f, "branch already has a spawn point"),
            Self::Identity(err) => write!(f, "cannot register leaf: {err}"),
        }
    }
}

impl core::error::Error for AddShapeError {}

impl From<RegisterError> for AddShapeError {
    fn from(err: RegisterError) -> Self {
        Self::Identity(err)
    }
}

/// An ordered collection of leaves, exactly one of which is the spawn
/// point, drawn recursively through that spawn point's transform.
///
/// The branch holds only the *order* of its leaves as identity keys; the
/// leaves themselves live in the registry arena, which is passed into
/// every operation. Nothing here holds a reference back into the scene.
///
/// ## The recursive draw
///
/// One branch draw with an iteration budget of N paints N nested branch
/// instances, but only one leaf list exists: the recursion unfolds purely
/// through transform state. Each level draws its non-spawn leaves in
/// insertion order; at the spawn point it pushes the spawn transform,
/// draws the marker, recurses with one less iteration, and pops before
/// continuing with its remaining siblings. Because the *whole* sibling
/// set is re-drawn inside the spawn frame — not just the spawn point —
/// leaves listed after the spawn point paint above the deeper copies,
/// while those before it are painted over by them, giving correct
/// interleaved Z-order with O(branch size) memory at any depth.
#[derive(Clone, Debug)]
pub struct Branch {
    order: Vec<ColorKey>,
    spawn: ColorKey,
}

impl Branch {
    /// Creates a branch containing only its spawn point.
    ///
    /// The spawn point gets the default generator transform; edit it via
    /// the leaf afterwards if another shape of recursion is wanted.
    pub fn new(registry: &mut LeafRegistry<Leaf>) -> Result<Self, RegisterError> {
        let spawn = registry.register_with(|key| {
            let mut leaf = Leaf::new(Geometry::SpawnPoint, key);
            let applied = leaf.set_transform(default_spawn_transform());
            debug_assert!(applied, "default spawn transform is invertible");
            leaf
        })?;
        Ok(Self {
            order: alloc::vec![spawn],
            spawn,
        })
    }

    /// Creates the demo branch: a spawn point plus three circles.
    ///
    /// This is the out-of-the-box composition an empty editor starts
    /// with, so there is something recursive on screen to explore.
    pub fn sample(registry: &mut LeafRegistry<Leaf>) -> Result<Self, RegisterError> {
        let mut branch = Self::new(registry)?;

        let circle = |registry: &mut LeafRegistry<Leaf>,
                          radius: f64,
                          color: Color,
                          transform: Affine|
         -> Result<ColorKey, RegisterError> {
            let key = registry.register_with(|key| {
                let mut leaf = Leaf::new(Geometry::Circle { radius, color }, key);
                let applied = leaf.set_transform(transform);
                debug_assert!(applied, "demo transforms are invertible");
                leaf
            })?;
            Ok(key)
        };

        let green = Color::from_rgb8(0x00, 0x80, 0x00);
        let red = Color::from_rgb8(0xFF, 0x00, 0x00);
        let blue = Color::from_rgb8(0x00, 0x00, 0xFF);

        let keys = [
            circle(registry, 15.0, green, Affine::translate((-10.0, -10.0)))?,
            circle(
                registry,
                20.0,
                red,
                Affine::scale_non_uniform(1.0, 0.5) * Affine::translate((0.0, 50.0)),
            )?,
            circle(
                registry,
                30.0,
                blue,
                Affine::rotate(30.0_f64.to_radians())
                    * Affine::scale_non_uniform(1.0, 0.2)
                    * Affine::translate((60.0, 0.0)),
            )?,
        ];
        branch.order.extend(keys);
        Ok(branch)
    }

    /// The leaves in draw order.
    #[must_use]
    pub fn leaves(&self) -> &[ColorKey] {
        &self.order
    }

    /// The spawn point's identity key.
    #[must_use]
    pub fn spawn_key(&self) -> ColorKey {
        self.spawn
    }

    /// The spawn point's local transform — the recursion generator.
    #[must_use]
    pub fn spawn_transform(&self, registry: &LeafRegistry<Leaf>) -> Affine {
        registry
            .get(self.spawn)
            .map(Leaf::transform)
            .unwrap_or(Affine::IDENTITY)
    }

    /// Constructs a leaf of `kind` at `world_position` and appends it.
    ///
    /// The new leaf's transform translates it to `world_position` scaled
    /// by `1 / view_scale`: leaf transforms live in pre-view space, so a
    /// drop position measured in zoomed screen units has to be divided
    /// back out. A non-positive `view_scale` is treated as 1.
    ///
    /// Construction and identity registration are atomic; on error
    /// nothing is added. Adding a second spawn point is refused.
    pub fn add_shape(
        &mut self,
        registry: &mut LeafRegistry<Leaf>,
        kind: LeafKind,
        world_position: Point,
        view_scale: f64,
    ) -> Result<ColorKey, AddShapeError> {
        if kind == LeafKind::SpawnPoint {
            return Err(AddShapeError::SecondSpawnPoint);
        }

        let scale = if view_scale > 0.0 { view_scale } else { 1.0 };
        let position = Vec2::new(world_position.x / scale, world_position.y / scale);

        let key = registry.register_with(|key| {
            let mut leaf = Leaf::new(Geometry::default_for(kind), key);
            let applied = leaf.set_transform(Affine::translate(position));
            debug_assert!(applied, "translations are invertible");
            leaf
        })?;
        self.order.push(key);
        Ok(key)
    }

    /// Removes a leaf, releasing its identity key.
    ///
    /// Returns `false` without changes for the spawn point (a branch
    /// must keep exactly one) or for a key not in this branch.
    pub fn delete(&mut self, registry: &mut LeafRegistry<Leaf>, key: ColorKey) -> bool {
        if key == self.spawn {
            return false;
        }
        let Some(index) = self.order.iter().position(|&k| k == key) else {
            return false;
        };
        self.order.remove(index);
        registry.unregister(key);
        true
    }

    /// Clears the selection flag on every leaf.
    ///
    /// A leaf's flag is shared by all of its recursive instances, so this
    /// clears the selection across the whole fractal regardless of depth.
    pub fn deselect_all(&self, registry: &mut LeafRegistry<Leaf>) {
        for &key in &self.order {
            if let Some(leaf) = registry.get_mut(key) {
                leaf.deselect();
            }
        }
    }

    /// Draws the branch with the given iteration budget.
    ///
    /// Each budget unit paints one branch instance, so `iterations = N`
    /// yields instances at depths `0..N` and exactly N samples in
    /// `stats`. A budget of 0 draws the flat (non-spawn) leaves once and
    /// records nothing.
    ///
    /// `identity` is the off-screen pick buffer; pass `None` outside edit
    /// mode to skip silhouette rendering entirely.
    pub fn draw(
        &self,
        registry: &LeafRegistry<Leaf>,
        visible: &mut dyn Surface,
        mut identity: Option<&mut (dyn Surface + '_)>,
        iterations: u32,
        stats: &mut BranchStatistics,
        clock: &dyn Clock,
    ) {
        if iterations == 0 {
            for &key in &self.order {
                let Some(leaf) = registry.get(key) else {
                    continue;
                };
                if !leaf.is_spawn_point() {
                    leaf.draw(visible, identity.as_deref_mut(), 0);
                }
            }
            return;
        }
        self.draw_rec(registry, visible, identity, iterations, iterations, 0, stats, clock);
    }

    /// One recursion level of the draw. `iterations` is at least 1.
    fn draw_rec(
        &self,
        registry: &LeafRegistry<Leaf>,
        visible: &mut dyn Surface,
        mut identity: Option<&mut (dyn Surface + '_)>,
        iterations: u32,
        total: u32,
        depth: u32,
        stats: &mut BranchStatistics,
        clock: &dyn Clock,
    ) {
        // One invocation consumes one budget unit, exactly once and up
        // front: decrementing anywhere else either double-draws or skips
        // the deepest instance.
        let remaining = iterations - 1;

        let start = clock.now_micros();
        let mut nested_micros: u64 = 0;

        for &key in &self.order {
            let Some(leaf) = registry.get(key) else {
                continue;
            };

            if !leaf.is_spawn_point() {
                leaf.draw(visible, identity.as_deref_mut(), depth);
                continue;
            }

            // The spawn point's frame must stay applied across the
            // recursive call, so the push/pop pair lives here instead of
            // inside the leaf's own balanced draw.
            visible.state(StateOp::PushTransform(leaf.transform()));
            if let Some(ident) = identity.as_deref_mut() {
                ident.state(StateOp::PushTransform(leaf.transform()));
            }

            leaf.draw_content(visible, identity.as_deref_mut(), depth);

            if remaining > 0 {
                let nested_start = clock.now_micros();
                self.draw_rec(
                    registry,
                    visible,
                    identity.as_deref_mut(),
                    remaining,
                    total,
                    depth + 1,
                    stats,
                    clock,
                );
                nested_micros += clock.now_micros().saturating_sub(nested_start);
            }

            visible.state(StateOp::PopTransform);
            if let Some(ident) = identity.as_deref_mut() {
                ident.state(StateOp::PopTransform);
            }
        }

        // Own render time: total elapsed minus everything spent inside
        // the recursive sub-call.
        let own = clock
            .now_micros()
            .saturating_sub(start)
            .saturating_sub(nested_micros);

        if iterations == total {
            stats.first_branch_micros = own;
        }
        if remaining == 0 {
            stats.last_branch_micros = own;
        }
        stats.branch_micros.push(own);
        stats.num_branches += 1;
    }
}
