// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use coppice_ident::ColorKey;
use coppice_imaging::{Color, DrawOp, StateOp, Surface, SurfaceExt, rgb24_to_color};
use coppice_transform::checked;

/// Minimum number of vertices a path leaf must keep.
///
/// Removing below this floor would leave a degenerate polygon with no
/// interior, which can neither be seen nor picked.
pub const MIN_PATH_POINTS: usize = 3;

/// Radius of the spawn-point marker, in branch-local units.
const SPAWN_MARKER_RADIUS: f64 = 3.0;

/// Default stroke width for line leaves, in local units.
const LINE_WIDTH: f64 = 1.0;

/// Discriminant of a leaf's shape kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// The branch's recursion generator; draws a small marker.
    SpawnPoint,
    /// A filled circle.
    Circle,
    /// A stroked line segment.
    Line,
    /// A filled axis-aligned rectangle.
    Rectangle,
    /// A filled closed polygon.
    Path,
}

/// Shape-specific geometry and appearance data.
///
/// Exactly the fields relevant to each kind exist; there are no unused
/// "maybe" fields shared across kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Marker-only recursion anchor.
    SpawnPoint,
    /// Filled circle centered on the local origin.
    Circle {
        /// Radius in local units (always non-negative).
        radius: f64,
        /// Fill color.
        color: Color,
    },
    /// Stroked segment between two local points.
    Line {
        /// Segment start.
        p0: Point,
        /// Segment end.
        p1: Point,
        /// Stroke color.
        color: Color,
    },
    /// Filled axis-aligned rectangle in local coordinates.
    Rectangle {
        /// The rectangle.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Filled closed polygon over an ordered vertex list.
    Path {
        /// Vertices in order; at least [`MIN_PATH_POINTS`].
        points: Vec<Point>,
        /// Fill color.
        color: Color,
    },
}

impl Geometry {
    /// Default geometry for a newly added leaf of the given kind.
    #[must_use]
    pub fn default_for(kind: LeafKind) -> Self {
        let gray = Color::from_rgb8(0x80, 0x80, 0x80);
        match kind {
            LeafKind::SpawnPoint => Self::SpawnPoint,
            LeafKind::Circle => Self::Circle {
                radius: 25.0,
                color: gray,
            },
            LeafKind::Line => Self::Line {
                p0: Point::new(-25.0, 0.0),
                p1: Point::new(25.0, 0.0),
                color: Color::from_rgb8(0, 0, 0),
            },
            LeafKind::Rectangle => Self::Rectangle {
                rect: Rect::new(-25.0, -15.0, 25.0, 15.0),
                color: gray,
            },
            LeafKind::Path => Self::Path {
                points: alloc::vec![
                    Point::new(0.0, -25.0),
                    Point::new(25.0, 25.0),
                    Point::new(-25.0, 25.0),
                ],
                color: gray,
            },
        }
    }

    /// The kind this geometry belongs to.
    #[must_use]
    pub fn kind(&self) -> LeafKind {
        match self {
            Self::SpawnPoint => LeafKind::SpawnPoint,
            Self::Circle { .. } => LeafKind::Circle,
            Self::Line { .. } => LeafKind::Line,
            Self::Rectangle { .. } => LeafKind::Rectangle,
            Self::Path { .. } => LeafKind::Path,
        }
    }
}

/// One drawable unit of a branch.
///
/// A leaf owns its local transform, geometry, selection flag, and its
/// registered identity key. It stores no back-reference to the branch or
/// tree; everything contextual is passed into the operations that need it.
///
/// The same leaf is drawn once per recursion depth each frame. Geometry
/// and the selection flag are shared across all of those instances —
/// selecting a leaf highlights every copy — while the depth of one
/// particular instance only ever exists in the identity buffer's pixels
/// and in the selection session.
#[derive(Clone, Debug)]
pub struct Leaf {
    geometry: Geometry,
    transform: Affine,
    key: ColorKey,
    selected: bool,
}

impl Leaf {
    /// Creates a leaf with the identity transform.
    ///
    /// Construction happens through the branch factory so that the
    /// identity key is registered atomically; this is not public API.
    pub(crate) fn new(geometry: Geometry, key: ColorKey) -> Self {
        Self {
            geometry,
            transform: Affine::IDENTITY,
            key,
            selected: false,
        }
    }

    /// The leaf's shape kind.
    #[must_use]
    pub fn kind(&self) -> LeafKind {
        self.geometry.kind()
    }

    /// Returns `true` for the branch's recursion generator.
    #[must_use]
    pub fn is_spawn_point(&self) -> bool {
        matches!(self.geometry, Geometry::SpawnPoint)
    }

    /// The leaf's registered identity key.
    #[must_use]
    pub fn key(&self) -> ColorKey {
        self.key
    }

    /// The identity-buffer pixel value for this leaf at `depth`.
    ///
    /// Identity bits come from the registered key; depth bits are added
    /// here, per draw call — depth is a property of the instance being
    /// drawn, not of the leaf.
    #[must_use]
    pub fn unique_color(&self, depth: u32) -> u32 {
        self.key.with_depth(depth)
    }

    /// The leaf's local transform.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Replaces the local transform, rejecting singular input.
    ///
    /// Returns `false` and keeps the previous transform when `transform`
    /// is not invertible. This is the only validation gate on transform
    /// edits; callers surface a rejection by simply re-displaying the
    /// unchanged value.
    pub fn set_transform(&mut self, transform: Affine) -> bool {
        match checked(transform) {
            Some(valid) => {
                self.transform = valid;
                true
            }
            None => false,
        }
    }

    /// Maps a point from the enclosing frame into leaf-local space.
    #[must_use]
    pub fn to_local(&self, point: Point) -> Point {
        self.transform.inverse() * point
    }

    /// Maps a leaf-local point into the enclosing frame.
    #[must_use]
    pub fn to_world(&self, point: Point) -> Point {
        self.transform * point
    }

    /// Marks the leaf as selected.
    pub fn select(&mut self) {
        self.selected = true;
    }

    /// Clears the selection flag.
    pub fn deselect(&mut self) {
        self.selected = false;
    }

    /// Returns `true` while the leaf is selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Read access to the geometry.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The leaf's appearance color, if its kind has one.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        match &self.geometry {
            Geometry::SpawnPoint => None,
            Geometry::Circle { color, .. }
            | Geometry::Line { color, .. }
            | Geometry::Rectangle { color, .. }
            | Geometry::Path { color, .. } => Some(*color),
        }
    }

    /// Sets the appearance color. No-op (`false`) for spawn points.
    pub fn set_color(&mut self, new: Color) -> bool {
        match &mut self.geometry {
            Geometry::SpawnPoint => false,
            Geometry::Circle { color, .. }
            | Geometry::Line { color, .. }
            | Geometry::Rectangle { color, .. }
            | Geometry::Path { color, .. } => {
                *color = new;
                true
            }
        }
    }

    /// Sets a circle's radius; the magnitude is stored.
    ///
    /// Returns `false` for other kinds or non-finite input, keeping the
    /// previous value.
    pub fn set_radius(&mut self, new: f64) -> bool {
        if !new.is_finite() {
            return false;
        }
        match &mut self.geometry {
            Geometry::Circle { radius, .. } => {
                *radius = new.abs();
                true
            }
            _ => false,
        }
    }

    /// Sets a line's endpoints. Returns `false` for other kinds.
    pub fn set_endpoints(&mut self, new_p0: Point, new_p1: Point) -> bool {
        match &mut self.geometry {
            Geometry::Line { p0, p1, .. } => {
                *p0 = new_p0;
                *p1 = new_p1;
                true
            }
            _ => false,
        }
    }

    /// Sets a rectangle's bounds. Returns `false` for other kinds.
    pub fn set_rect(&mut self, new: Rect) -> bool {
        match &mut self.geometry {
            Geometry::Rectangle { rect, .. } => {
                *rect = new;
                true
            }
            _ => false,
        }
    }

    /// Appends a vertex to a path. Returns `false` for other kinds.
    pub fn push_point(&mut self, point: Point) -> bool {
        match &mut self.geometry {
            Geometry::Path { points, .. } => {
                points.push(point);
                true
            }
            _ => false,
        }
    }

    /// Moves an existing path vertex. Returns `false` for other kinds or
    /// an out-of-range index.
    pub fn set_point(&mut self, index: usize, point: Point) -> bool {
        match &mut self.geometry {
            Geometry::Path { points, .. } => match points.get_mut(index) {
                Some(slot) => {
                    *slot = point;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Removes a path vertex, refusing to drop below [`MIN_PATH_POINTS`].
    ///
    /// Returns `false` (a reported no-op, not an error) at the floor, for
    /// an out-of-range index, or for other kinds.
    pub fn remove_point(&mut self, index: usize) -> bool {
        match &mut self.geometry {
            Geometry::Path { points, .. } => {
                if points.len() <= MIN_PATH_POINTS || index >= points.len() {
                    return false;
                }
                points.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Draws the leaf inside its own local transform.
    ///
    /// Pushes the local transform on both surfaces, emits the content,
    /// and pops again — the ambient frame is restored before returning.
    /// The branch handles its spawn point separately (the recursion has
    /// to happen *inside* the pushed frame), so this path is only taken
    /// for non-spawn leaves.
    pub fn draw(
        &self,
        visible: &mut dyn Surface,
        mut identity: Option<&mut (dyn Surface + '_)>,
        depth: u32,
    ) {
        visible.state(StateOp::PushTransform(self.transform));
        if let Some(ident) = identity.as_deref_mut() {
            ident.state(StateOp::PushTransform(self.transform));
        }

        self.draw_content(visible, identity.as_deref_mut(), depth);

        visible.state(StateOp::PopTransform);
        if let Some(ident) = identity {
            ident.state(StateOp::PopTransform);
        }
    }

    /// Emits the leaf's content in the *current* frame, without touching
    /// the transform stack.
    pub(crate) fn draw_content(
        &self,
        visible: &mut dyn Surface,
        identity: Option<&mut (dyn Surface + '_)>,
        depth: u32,
    ) {
        self.draw_appearance(visible);
        if let Some(ident) = identity {
            self.draw_silhouette(ident, depth);
        }
    }

    /// Real appearance, onto the visible surface.
    fn draw_appearance(&self, surface: &mut dyn Surface) {
        match &self.geometry {
            Geometry::SpawnPoint => {
                surface.set_stroke(Color::from_rgba8(0, 0, 0, 128), LINE_WIDTH);
                surface.stroke_circle(Point::ORIGIN, SPAWN_MARKER_RADIUS);
            }
            Geometry::Circle { radius, color } => {
                surface.set_fill(*color);
                surface.fill_circle(Point::ORIGIN, *radius);
            }
            Geometry::Line { p0, p1, color } => {
                surface.set_stroke(*color, LINE_WIDTH);
                surface.draw(DrawOp::Line { p0: *p0, p1: *p1 });
            }
            Geometry::Rectangle { rect, color } => {
                surface.set_fill(*color);
                surface.draw(DrawOp::FillRect { rect: *rect });
            }
            Geometry::Path { points, color } => {
                surface.set_fill(*color);
                surface.draw(DrawOp::FillPolygon {
                    points: points.clone().into_boxed_slice(),
                });
            }
        }
    }

    /// Flat silhouette in the instance's pick color, onto the identity
    /// buffer.
    ///
    /// Stroked kinds (the line, the spawn marker) are drawn with a wider
    /// stroke / filled disc than their visible appearance so thin shapes
    /// remain clickable.
    fn draw_silhouette(&self, surface: &mut dyn Surface, depth: u32) {
        let pick = rgb24_to_color(self.unique_color(depth));
        match &self.geometry {
            Geometry::SpawnPoint => {
                surface.set_fill(pick);
                surface.fill_circle(Point::ORIGIN, SPAWN_MARKER_RADIUS);
            }
            Geometry::Circle { radius, .. } => {
                surface.set_fill(pick);
                surface.fill_circle(Point::ORIGIN, *radius);
            }
            Geometry::Line { p0, p1, .. } => {
                surface.set_stroke(pick, LINE_WIDTH * 3.0);
                surface.draw(DrawOp::Line { p0: *p0, p1: *p1 });
            }
            Geometry::Rectangle { rect, .. } => {
                surface.set_fill(pick);
                surface.draw(DrawOp::FillRect { rect: *rect });
            }
            Geometry::Path { points, .. } => {
                surface.set_fill(pick);
                surface.draw(DrawOp::FillPolygon {
                    points: points.clone().into_boxed_slice(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coppice_ident::LeafRegistry;
    use coppice_imaging::{RecordSurface, RecordedOp};

    fn leaf(kind: LeafKind) -> (LeafRegistry<Leaf>, ColorKey) {
        let mut registry = LeafRegistry::new();
        let key = registry
            .register_with(|key| Leaf::new(Geometry::default_for(kind), key))
            .expect("fresh registry has room");
        (registry, key)
    }

    #[test]
    fn set_transform_rejects_singular_and_keeps_previous() {
        let (mut registry, key) = leaf(LeafKind::Circle);
        let leaf = registry.get_mut(key).expect("just registered");

        let good = Affine::translate((10.0, 5.0)) * Affine::rotate(0.2);
        assert!(leaf.set_transform(good));
        assert!(!leaf.set_transform(Affine::scale(0.0)));
        assert_eq!(leaf.transform(), good);
    }

    #[test]
    fn local_world_round_trip() {
        let (mut registry, key) = leaf(LeafKind::Circle);
        let leaf = registry.get_mut(key).expect("just registered");
        assert!(leaf.set_transform(Affine::translate((60.0, 0.0)) * Affine::scale(2.0)));

        let world = Point::new(64.0, 8.0);
        let local = leaf.to_local(world);
        assert_eq!(local, Point::new(2.0, 4.0));
        assert_eq!(leaf.to_world(local), world);
    }

    #[test]
    fn unique_color_carries_depth_bits() {
        let (registry, key) = leaf(LeafKind::Circle);
        let leaf = registry.get(key).expect("just registered");
        assert_eq!(leaf.unique_color(0), key.with_depth(0));
        assert_ne!(leaf.unique_color(0), leaf.unique_color(3));
        assert_eq!(leaf.unique_color(3) & !0x3FF, key.get());
    }

    #[test]
    fn path_vertex_floor_is_enforced() {
        let (mut registry, key) = leaf(LeafKind::Path);
        let leaf = registry.get_mut(key).expect("just registered");

        // The default path is a triangle: already at the floor.
        assert!(!leaf.remove_point(0));
        let Geometry::Path { points, .. } = leaf.geometry() else {
            panic!("expected a path");
        };
        assert_eq!(points.len(), MIN_PATH_POINTS);

        assert!(leaf.push_point(Point::new(0.0, 40.0)));
        assert!(leaf.remove_point(3));
        assert!(!leaf.remove_point(0));
    }

    #[test]
    fn geometry_mutators_are_kind_gated() {
        let (mut registry, key) = leaf(LeafKind::Circle);
        let leaf = registry.get_mut(key).expect("just registered");

        assert!(leaf.set_radius(-12.0));
        let Geometry::Circle { radius, .. } = leaf.geometry() else {
            panic!("expected a circle");
        };
        assert_eq!(*radius, 12.0, "magnitude is stored");

        assert!(!leaf.set_radius(f64::NAN));
        assert!(!leaf.set_endpoints(Point::ORIGIN, Point::ORIGIN));
        assert!(!leaf.set_rect(Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert!(!leaf.push_point(Point::ORIGIN));
    }

    #[test]
    fn spawn_point_has_no_editable_color() {
        let (mut registry, key) = leaf(LeafKind::SpawnPoint);
        let leaf = registry.get_mut(key).expect("just registered");
        assert_eq!(leaf.color(), None);
        assert!(!leaf.set_color(Color::from_rgb8(1, 2, 3)));
    }

    #[test]
    fn draw_balances_the_transform_stack() {
        let (mut registry, key) = leaf(LeafKind::Circle);
        {
            let leaf = registry.get_mut(key).expect("just registered");
            assert!(leaf.set_transform(Affine::translate((10.0, 0.0))));
        }
        let leaf = registry.get(key).expect("just registered");

        let mut visible = RecordSurface::new();
        let mut identity = RecordSurface::new();
        leaf.draw(&mut visible, Some(&mut identity), 2);

        assert_eq!(visible.transform(), Affine::IDENTITY);
        assert_eq!(identity.transform(), Affine::IDENTITY);

        // The circle itself was drawn inside the leaf's frame.
        let (_, at) = visible.draw_events().next().expect("one draw");
        assert_eq!(at, Affine::translate((10.0, 0.0)));

        // The silhouette carries the depth-encoded pick color.
        let pick_fill = identity.events().iter().find_map(|event| match &event.op {
            RecordedOp::State(StateOp::SetFill(color)) => Some(*color),
            _ => None,
        });
        assert_eq!(
            pick_fill.map(coppice_imaging::color_to_rgb24),
            Some(leaf.unique_color(2))
        );
    }
}
