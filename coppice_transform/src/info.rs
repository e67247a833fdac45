// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Vec2};

/// Decomposed view of an affine transform.
///
/// A `TransformInfo` describes a transform as `translate · rotate · scale`
/// (scale applied first). It is what transform property editors display
/// and what they hand back to [`recompose`] after the user edits a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformInfo {
    /// Translation component.
    pub translation: Vec2,
    /// Rotation in radians, in `(-π, π]`.
    pub rotation_rad: f64,
    /// Rotation in degrees, in `(-180°, 180°]`.
    pub rotation_deg: f64,
    /// Per-axis scale factors (lengths of the transformed basis vectors).
    pub scale: Vec2,
}

impl TransformInfo {
    /// Mean of the two axis scale factors.
    ///
    /// Hit-test widths (stroke picking, handle sizes) are scaled by this
    /// value so they stay visually constant under non-uniform scale
    /// instead of tracking one arbitrary axis.
    #[must_use]
    pub fn average_scale(&self) -> f64 {
        (self.scale.x + self.scale.y) / 2.0
    }
}

/// Decomposes `affine` into translation, rotation, and per-axis scale.
///
/// The per-axis scales are the lengths of the images of the X and Y basis
/// vectors. Rotation is the angle of the transformed X basis vector
/// (`atan2` on its components), not naive trig on individual matrix
/// entries, so a chain of rotations and scales decomposes back to the
/// angle its construction implies:
///
/// ```
/// use kurbo::Affine;
/// use coppice_transform::decompose;
///
/// let t = Affine::rotate(50.0_f64.to_radians())
///     * Affine::scale(2.0)
///     * Affine::rotate(20.0_f64.to_radians())
///     * Affine::scale_non_uniform(1.2, 1.4);
/// let info = decompose(t);
/// assert!((info.rotation_deg - 70.0).abs() < 1e-9);
/// assert!((info.scale.x - 2.4).abs() < 1e-9);
/// assert!((info.scale.y - 2.8).abs() < 1e-9);
/// ```
///
/// Decomposition is lossy for transforms with shear: `recompose` of the
/// result reproduces the input only for transforms actually built from
/// translate/rotate/scale, which is all the editor produces.
#[must_use]
pub fn decompose(affine: Affine) -> TransformInfo {
    let [a, b, c, d, e, f] = affine.as_coeffs();

    // Images of the basis vectors: column-major coefficients, so the X
    // basis maps to (a, b) and the Y basis to (c, d).
    let basis_x = Vec2::new(a, b);
    let basis_y = Vec2::new(c, d);

    let rotation_rad = basis_x.atan2();

    TransformInfo {
        translation: Vec2::new(e, f),
        rotation_rad,
        rotation_deg: rotation_rad.to_degrees(),
        scale: Vec2::new(basis_x.hypot(), basis_y.hypot()),
    }
}

/// Rebuilds an affine transform from its decomposed components.
///
/// The result is `translate · rotate · scale`, matching the
/// interpretation used by [`decompose`]. `rotation_rad` is the
/// authoritative angle; the degree field is ignored.
#[must_use]
pub fn recompose(info: &TransformInfo) -> Affine {
    Affine::translate(info.translation)
        * Affine::rotate(info.rotation_rad)
        * Affine::scale_non_uniform(info.scale.x, info.scale.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn decomposes_chained_rotate_and_scale() {
        // Composite of two rotations and three scales; the uniform scale
        // commutes with rotation, so the whole chain collapses to a single
        // rotation of 70 degrees and per-axis scales of 2.4 and 2.8.
        let t = Affine::rotate(50.0_f64.to_radians())
            * Affine::scale(2.0)
            * Affine::rotate(20.0_f64.to_radians())
            * Affine::scale_non_uniform(1.2, 1.4);

        let info = decompose(t);
        assert_close(info.rotation_deg, 70.0);
        assert_close(info.scale.x, 2.4);
        assert_close(info.scale.y, 2.8);
        assert_close(info.translation.x, 0.0);
        assert_close(info.translation.y, 0.0);
    }

    #[test]
    fn round_trips_translate_rotate_scale() {
        let info = TransformInfo {
            translation: Vec2::new(-12.5, 48.0),
            rotation_rad: 0.6,
            rotation_deg: 0.6_f64.to_degrees(),
            scale: Vec2::new(1.7, 0.4),
        };

        let rebuilt = decompose(recompose(&info));
        assert_close(rebuilt.translation.x, info.translation.x);
        assert_close(rebuilt.translation.y, info.translation.y);
        assert_close(rebuilt.rotation_rad, info.rotation_rad);
        assert_close(rebuilt.scale.x, info.scale.x);
        assert_close(rebuilt.scale.y, info.scale.y);
    }

    #[test]
    fn rotation_covers_all_quadrants() {
        for deg in [-170.0_f64, -90.0, -15.0, 0.0, 15.0, 90.0, 179.0] {
            let t = Affine::rotate(deg.to_radians());
            assert_close(decompose(t).rotation_deg, deg);
        }
    }

    #[test]
    fn average_scale_is_axis_mean() {
        let info = decompose(Affine::scale_non_uniform(2.0, 4.0));
        assert_close(info.average_scale(), 3.0);
    }

    #[test]
    fn pure_translation_decomposes_cleanly() {
        let info = decompose(Affine::translate((7.0, -3.0)));
        assert_close(info.translation.x, 7.0);
        assert_close(info.translation.y, -3.0);
        assert_close(info.rotation_deg, 0.0);
        assert_close(info.scale.x, 1.0);
        assert_close(info.scale.y, 1.0);
    }
}
