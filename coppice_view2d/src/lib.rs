// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice View2D: the editor viewport's pan/zoom state.
//!
//! The editor views an unbounded world plane through a window. The view
//! is an offset (where the world origin lands, in window pixels) plus a
//! uniform scale, with clamps that keep the user from panning or zooming
//! the scene irrecoverably far away:
//!
//! - Scale is limited to the range from [`ViewState::MIN_SCALE`] to
//!   [`ViewState::MAX_SCALE`].
//! - The offset may wander at most [`ViewState::MAX_OFFSET`] world units
//!   (scaled) from the window center.
//!
//! [`ViewState::world_to_view`] / [`ViewState::view_to_world`] expose the
//! mapping as affines, which is what the scene's draw pass pushes as its
//! base frame and what input handling uses to express pointer positions
//! in world space. Zooming is anchored at the window center, matching
//! wheel-zoom behavior.
//!
//! This crate is `no_std`-capable via kurbo's `libm` feature.

#![no_std]

use kurbo::{Affine, Point, Vec2};

/// Pan/zoom state of the editor window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    window_size: Vec2,
    offset: Vec2,
    scale: f64,
}

impl ViewState {
    /// Minimum view scale (maximum zoom out).
    pub const MIN_SCALE: f64 = 0.2;

    /// Maximum view scale (maximum zoom in).
    pub const MAX_SCALE: f64 = 100.0;

    /// Maximum world-unit distance the offset may stray from the window
    /// center (scaled by the current zoom).
    pub const MAX_OFFSET: f64 = 5000.0;

    /// Creates a view over a window of the given pixel size, with the
    /// world origin centered and scale 1.
    #[must_use]
    pub fn new(window_size: Vec2) -> Self {
        Self {
            window_size,
            offset: window_size / 2.0,
            scale: 1.0,
        }
    }

    /// Current window size in pixels.
    #[must_use]
    pub fn window_size(&self) -> Vec2 {
        self.window_size
    }

    /// Updates the window size, keeping offset and scale.
    ///
    /// The offset is re-clamped against the new center.
    pub fn set_window_size(&mut self, size: Vec2) {
        self.window_size = size;
        self.clamp_offset();
    }

    /// Where the world origin lands, in window pixels.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Current uniform zoom factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Pans the view by a delta in window pixels, then clamps.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
        self.clamp_offset();
    }

    /// Re-centers the world origin in the window.
    pub fn reset_offset(&mut self) {
        self.offset = self.window_size / 2.0;
    }

    /// Resets the zoom to 1.
    pub fn reset_scale(&mut self) {
        self.scale = 1.0;
        self.clamp_offset();
    }

    /// Multiplies the zoom by `factor`, anchored at the window center.
    ///
    /// The world point under the window center stays put; everything else
    /// scales around it. Non-positive factors are ignored; the resulting
    /// scale is clamped to the scale limits.
    pub fn zoom_about_center(&mut self, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let old_scale = self.scale;
        self.scale = (old_scale * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);

        // Keep the window-center world point fixed: scale the offset's
        // distance from the center by the applied factor.
        let applied = self.scale / old_scale;
        let center = self.window_size / 2.0;
        self.offset = (self.offset - center) * applied + center;
        self.clamp_offset();
    }

    /// World-to-window transform: scale, then translate by the offset.
    #[must_use]
    pub fn world_to_view(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Window-to-world transform, the inverse of
    /// [`ViewState::world_to_view`].
    #[must_use]
    pub fn view_to_world(&self) -> Affine {
        // Scale is clamped to a positive range, so this is always
        // invertible.
        self.world_to_view().inverse()
    }

    /// Maps a world point to window pixels.
    #[must_use]
    pub fn world_to_view_point(&self, point: Point) -> Point {
        self.world_to_view() * point
    }

    /// Maps a window-pixel point to world coordinates.
    #[must_use]
    pub fn view_to_world_point(&self, point: Point) -> Point {
        self.view_to_world() * point
    }

    /// The world position currently under the window center.
    ///
    /// This is what the status bar reports as the view position.
    #[must_use]
    pub fn center_world_position(&self) -> Point {
        self.view_to_world_point((self.window_size / 2.0).to_point())
    }

    /// Snapshot of the current view state for debugging and inspection.
    #[must_use]
    pub fn debug_info(&self) -> ViewDebugInfo {
        ViewDebugInfo {
            window_size: self.window_size,
            offset: self.offset,
            scale: self.scale,
            center_world_position: self.center_world_position(),
        }
    }

    fn clamp_offset(&mut self) {
        let center = self.window_size / 2.0;
        let limit = Self::MAX_OFFSET * self.scale;
        self.offset.x = self.offset.x.clamp(center.x - limit, center.x + limit);
        self.offset.y = self.offset.y.clamp(center.y - limit, center.y + limit);
    }
}

/// Debug snapshot of a [`ViewState`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewDebugInfo {
    /// Window size in pixels.
    pub window_size: Vec2,
    /// Window-pixel position of the world origin.
    pub offset: Vec2,
    /// Uniform zoom factor.
    pub scale: f64,
    /// World position under the window center.
    pub center_world_position: Point,
}
