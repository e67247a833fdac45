// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Imaging Pixel Backend.
//!
//! [`PixSurface`] is a CPU-side implementation of
//! [`Surface`](coppice_imaging::Surface) over a plain `Vec` of packed
//! 24-bit pixels. It exists for two jobs:
//!
//! - The **identity buffer**: every leaf instance is drawn as a flat
//!   silhouette in its pick color; a click samples one pixel via
//!   [`PixelSource`](coppice_imaging::PixelSource). Flat, hard-edged
//!   coverage is exactly what picking needs — an antialiased edge pixel
//!   would blend two identities into a color belonging to neither.
//! - Headless rendering in tests, where asserting on a handful of pixels
//!   is more direct than inspecting an op log.
//!
//! Coverage is containment-based rather than scanline-based: each shape is
//! taken to device space and a pixel is covered when its center lies
//! inside the shape (winding test for polygons and rectangles, inverse
//! radial test for ellipses, distance-to-segment for stroked lines).
//! Stroke widths are scaled by the current transform's average axis scale
//! so they stay visually consistent under non-uniform scale.
//!
//! It is intentionally *not* a quality renderer: no antialiasing, no
//! blending, no clipping beyond the buffer bounds.

use kurbo::{BezPath, Line, ParamCurveNearest, Point, Rect, Shape, Vec2};

use coppice_imaging::{
    Affine, Color, DrawOp, PixelSource, StateOp, Surface, color_to_rgb24,
};
use coppice_transform::{TransformStack, decompose, is_invertible};

/// Accuracy passed to kurbo's nearest-point queries, in device pixels.
const NEAREST_ACCURACY: f64 = 1e-3;

/// A CPU pixel-buffer drawing surface.
///
/// Pixels are packed `0xRRGGBB`. A freshly created surface is cleared to
/// pure white, which is also the identity registry's reserved background
/// sentinel — so an untouched identity buffer resolves every click to a
/// miss.
#[derive(Clone, Debug)]
pub struct PixSurface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    stack: TransformStack,
    fill: u32,
    stroke: u32,
    stroke_width: f64,
}

impl PixSurface {
    /// Background color a new or cleared surface is filled with.
    pub const CLEAR_RGB: u32 = 0xFF_FFFF;

    /// Creates a surface of the given pixel dimensions, cleared to white.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Self::CLEAR_RGB; (width as usize) * (height as usize)],
            stack: TransformStack::new(),
            fill: 0x00_0000,
            stroke: 0x00_0000,
            stroke_width: 1.0,
        }
    }

    /// Resets every pixel to `color` and the transform stack to its base.
    pub fn clear(&mut self, color: Color) {
        let rgb = color_to_rgb24(color);
        self.pixels.fill(rgb);
        self.stack.reset();
    }

    /// Resets every pixel to the white background sentinel.
    pub fn clear_background(&mut self) {
        self.pixels.fill(Self::CLEAR_RGB);
        self.stack.reset();
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    fn put(&mut self, x: i32, y: i32, rgb: u32) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = rgb;
        }
    }

    /// Integer pixel bounds covering a device-space rectangle, clamped to
    /// the buffer. Returns `None` when the rectangle misses the buffer.
    fn pixel_bounds(&self, device: Rect) -> Option<(i32, i32, i32, i32)> {
        let x0 = (device.min_x().floor().max(0.0)) as i32;
        let y0 = (device.min_y().floor().max(0.0)) as i32;
        let x1 = (device.max_x().ceil().min(f64::from(self.width))) as i32;
        let y1 = (device.max_y().ceil().min(f64::from(self.height))) as i32;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    /// Device-space bounding rectangle of a transformed local rectangle.
    fn device_bbox(&self, local: Rect) -> Rect {
        self.stack.current().transform_rect_bbox(local)
    }

    fn fill_device_path(&mut self, path: &BezPath, rgb: u32) {
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(path.bounding_box()) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if path.contains(center) {
                    self.put(x, y, rgb);
                }
            }
        }
    }

    fn fill_polygon_device(&mut self, device_points: &[Point], rgb: u32) {
        if device_points.len() < 3 {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(device_points[0]);
        for &pt in &device_points[1..] {
            path.line_to(pt);
        }
        path.close_path();
        self.fill_device_path(&path, rgb);
    }

    fn draw_ellipse(&mut self, center: Point, radii: Vec2, rgb: u32, band: Option<f64>) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        let current = self.stack.current();
        if !is_invertible(current) {
            return;
        }
        let inverse = current.inverse();

        // Pad the local bounds when stroking so the outer half of the band
        // is not clipped out of the scanned pixel range.
        let pad = band.unwrap_or(0.0);
        let local = Rect::new(
            center.x - radii.x - pad,
            center.y - radii.y - pad,
            center.x + radii.x + pad,
            center.y + radii.y + pad,
        );
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(self.device_bbox(local)) else {
            return;
        };

        // Normalized radial distance: 1.0 on the outline. The band half
        // width is expressed in that normalized space via the mean radius.
        let mean_radius = (radii.x + radii.y) / 2.0;
        for y in y0..y1 {
            for x in x0..x1 {
                let device = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let local_pt = inverse * device;
                let nx = (local_pt.x - center.x) / radii.x;
                let ny = (local_pt.y - center.y) / radii.y;
                let rho = (nx * nx + ny * ny).sqrt();
                let covered = match band {
                    None => rho <= 1.0,
                    Some(half) => (rho - 1.0).abs() * mean_radius <= half,
                };
                if covered {
                    self.put(x, y, rgb);
                }
            }
        }
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        let current = self.stack.current();
        let device = Line::new(current * p0, current * p1);

        // Scale the local-unit stroke width by the transform's average
        // axis scale so lines keep a consistent visual weight.
        let half = (self.stroke_width * decompose(current).average_scale() / 2.0).max(0.5);

        let bounds = Rect::from_points(device.p0, device.p1).inflate(half + 1.0, half + 1.0);
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let dist = device.nearest(center, NEAREST_ACCURACY).distance_sq.sqrt();
                if dist <= half {
                    self.put(x, y, self.stroke);
                }
            }
        }
    }
}

impl Surface for PixSurface {
    fn state(&mut self, op: StateOp) {
        match op {
            StateOp::PushTransform(local) => self.stack.push(local),
            StateOp::PopTransform => {
                self.stack.pop();
            }
            StateOp::SetFill(color) => self.fill = color_to_rgb24(color),
            StateOp::SetStroke { color, width } => {
                self.stroke = color_to_rgb24(color);
                self.stroke_width = width;
            }
        }
    }

    fn draw(&mut self, op: DrawOp) {
        match op {
            DrawOp::FillEllipse { center, radii } => {
                self.draw_ellipse(center, radii, self.fill, None);
            }
            DrawOp::StrokeEllipse { center, radii } => {
                let half = (self.stroke_width / 2.0).max(0.5);
                self.draw_ellipse(center, radii, self.stroke, Some(half));
            }
            DrawOp::FillRect { rect } => {
                let current = self.stack.current();
                let corners = [
                    current * Point::new(rect.x0, rect.y0),
                    current * Point::new(rect.x1, rect.y0),
                    current * Point::new(rect.x1, rect.y1),
                    current * Point::new(rect.x0, rect.y1),
                ];
                self.fill_polygon_device(&corners, self.fill);
            }
            DrawOp::Line { p0, p1 } => self.draw_line(p0, p1),
            DrawOp::FillPolygon { points } => {
                let current = self.stack.current();
                let device: Vec<Point> = points.iter().map(|&pt| current * pt).collect();
                let fill = self.fill;
                self.fill_polygon_device(&device, fill);
            }
        }
    }

    fn transform(&self) -> Affine {
        self.stack.current()
    }
}

impl PixelSource for PixSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn rgb24_at(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }
}
