// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Imaging: backend-agnostic drawing surface abstraction.
//!
//! The recursive scene graph needs very little from a renderer: filled and
//! stroked primitives (ellipse, line, rectangle, polygon) and an
//! affine-transform-aware paint state stack. This crate defines that
//! contract as plain-old-data operations plus a small [`Surface`] trait,
//! so the same draw code can target a CPU pixel buffer, a recording used
//! by tests, or a real rendering backend.
//!
//! # Core concepts
//!
//! - **Operations**: [`StateOp`] mutates ambient paint state (the
//!   transform stack and the current fill/stroke), [`DrawOp`] produces
//!   output using that state. Geometry payloads are in local coordinates
//!   and are subject to the current transform.
//! - **Surfaces**: [`Surface`] accepts operations and reports the current
//!   composed transform. [`SurfaceExt::with_transform`] wraps a closure in
//!   a paired push/pop so callers cannot unbalance the stack.
//! - **Sampling**: [`PixelSource`] is the read-back seam. The identity
//!   buffer used for click picking is just a `Surface` whose backend also
//!   implements `PixelSource`; picking samples one pixel and never needs
//!   to know how it was produced.
//! - **Recording**: [`RecordSurface`] implements `Surface` by logging
//!   every operation together with the transform at apply time. Tests use
//!   it to assert *where* something was drawn without rasterizing.
//!
//! Two surfaces are drawn per frame: the visible one with real appearance,
//! and (in edit mode) the identity buffer where every shape is a flat
//! silhouette filled with its identity color. Both go through this same
//! interface.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod record;

pub use record::{RecordEvent, RecordSurface, RecordedOp};

use alloc::boxed::Box;
use kurbo::{Point, Rect, Vec2};
pub use peniko::Color;

/// Affine transform type used by the surface contract.
pub type Affine = kurbo::Affine;

/// State operations that mutate the ambient paint state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateOp {
    /// Push a new transform frame: the current frame composed with the
    /// given local transform. Must be matched by a
    /// [`StateOp::PopTransform`].
    PushTransform(Affine),
    /// Pop the most recently pushed transform frame.
    PopTransform,
    /// Set the current fill color.
    SetFill(Color),
    /// Set the current stroke color and width.
    ///
    /// The width is in local units; backends scale it by the current
    /// transform's average axis scale so strokes stay visually consistent
    /// under non-uniform scale.
    SetStroke {
        /// Stroke color.
        color: Color,
        /// Stroke width in local units.
        width: f64,
    },
}

/// Draw operations that produce output using the current state.
///
/// All coordinates are local and subject to the current transform.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill an axis-aligned ellipse with the current fill color.
    FillEllipse {
        /// Ellipse center.
        center: Point,
        /// Per-axis radii.
        radii: Vec2,
    },
    /// Stroke the outline of an axis-aligned ellipse with the current
    /// stroke.
    StrokeEllipse {
        /// Ellipse center.
        center: Point,
        /// Per-axis radii.
        radii: Vec2,
    },
    /// Fill an axis-aligned rectangle with the current fill color.
    FillRect {
        /// The rectangle in local coordinates.
        rect: Rect,
    },
    /// Stroke a line segment with the current stroke.
    Line {
        /// Segment start.
        p0: Point,
        /// Segment end.
        p1: Point,
    },
    /// Fill a closed polygon with the current fill color.
    ///
    /// The vertex list is interpreted as a closed loop; backends connect
    /// the last vertex back to the first. Fewer than three vertices draw
    /// nothing.
    FillPolygon {
        /// Polygon vertices in order.
        points: Box<[Point]>,
    },
}

/// Minimal drawing surface trait.
///
/// A surface interprets [`StateOp`]s and [`DrawOp`]s against its own
/// backing store. Implementations must maintain the transform stack
/// semantics: [`StateOp::PushTransform`] composes onto the current frame,
/// [`StateOp::PopTransform`] restores the previous one, and an unmatched
/// pop at the base frame is ignored rather than an error.
pub trait Surface {
    /// Apply a state operation.
    fn state(&mut self, op: StateOp);

    /// Apply a draw operation.
    fn draw(&mut self, op: DrawOp);

    /// Returns the current composed transform.
    fn transform(&self) -> Affine;
}

/// Convenience helpers for [`Surface`] callers.
///
/// This is separate from [`Surface`] so that methods can accept closures
/// and return values without complicating trait object usage
/// (`&mut dyn Surface`).
pub trait SurfaceExt: Surface {
    /// Run `f` inside a pushed transform frame, popping it afterwards.
    ///
    /// Note: if `f` panics, the frame will not be popped.
    #[inline]
    fn with_transform<R>(&mut self, local: Affine, f: impl FnOnce(&mut Self) -> R) -> R {
        self.state(StateOp::PushTransform(local));
        let out = f(self);
        self.state(StateOp::PopTransform);
        out
    }

    /// Set the current fill color.
    #[inline]
    fn set_fill(&mut self, color: Color) {
        self.state(StateOp::SetFill(color));
    }

    /// Set the current stroke color and width.
    #[inline]
    fn set_stroke(&mut self, color: Color, width: f64) {
        self.state(StateOp::SetStroke { color, width });
    }

    /// Fill a circle of the given radius.
    #[inline]
    fn fill_circle(&mut self, center: Point, radius: f64) {
        self.draw(DrawOp::FillEllipse {
            center,
            radii: Vec2::new(radius, radius),
        });
    }

    /// Stroke the outline of a circle of the given radius.
    #[inline]
    fn stroke_circle(&mut self, center: Point, radius: f64) {
        self.draw(DrawOp::StrokeEllipse {
            center,
            radii: Vec2::new(radius, radius),
        });
    }
}

impl<S: Surface + ?Sized> SurfaceExt for S {}

/// Pixel read-back interface for surfaces with an addressable backing
/// store.
///
/// Coordinates are device pixels; out-of-bounds positions return `None`.
/// The returned value is a packed 24-bit `0xRRGGBB` color, which is the
/// representation the identity registry's lookup consumes.
pub trait PixelSource {
    /// Width of the backing store in pixels.
    fn width(&self) -> u32;

    /// Height of the backing store in pixels.
    fn height(&self) -> u32;

    /// Returns the packed RGB color at `(x, y)`, or `None` out of bounds.
    fn rgb24_at(&self, x: i32, y: i32) -> Option<u32>;
}

/// Packs a [`Color`] into 24-bit `0xRRGGBB`, dropping alpha.
#[must_use]
pub fn color_to_rgb24(color: Color) -> u32 {
    let rgba = color.to_rgba8();
    (u32::from(rgba.r) << 16) | (u32::from(rgba.g) << 8) | u32::from(rgba.b)
}

/// Unpacks a 24-bit `0xRRGGBB` value into an opaque [`Color`].
#[must_use]
pub fn rgb24_to_color(rgb: u32) -> Color {
    let [_, r, g, b] = rgb.to_be_bytes();
    Color::from_rgb8(r, g, b)
}
