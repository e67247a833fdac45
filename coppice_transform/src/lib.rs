// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Transform: affine transform utilities for the recursive editor.
//!
//! Everything in Coppice that moves, rotates, or scales goes through a
//! [`kurbo::Affine`]. This crate collects the handful of operations the
//! rest of the workspace needs on top of what kurbo already provides:
//!
//! - **Guarded mutation**: [`checked`] / [`is_invertible`] are the single
//!   validation gate for leaf-local transforms. A transform that cannot be
//!   inverted cannot be hit-tested or dragged, so mutations that would make
//!   one singular are rejected at the edge and the previous value kept.
//! - **Decomposition**: [`decompose`] recovers translation, rotation, and
//!   per-axis scale from a composed matrix, for property editors that want
//!   to display and re-enter those components. [`recompose`] is the
//!   inverse, rebuilding `translate · rotate · scale`.
//! - **Depth powers**: [`self_compose`] raises a transform to an integer
//!   power, which is how the cumulative frame of the N-th recursive branch
//!   instance is obtained from the spawn point's transform.
//! - **An explicit stack**: [`TransformStack`] makes the recursive draw's
//!   save/apply/restore contract a plain data structure instead of a side
//!   effect of some particular graphics API's paint state.
//!
//! ## Conventions
//!
//! Composition follows kurbo: `a * b` applies `b` first, then `a`. A
//! decomposed transform is interpreted as `translate · rotate · scale`,
//! i.e. scale is applied first. Rotation is recovered from the angle of
//! the transformed X basis vector rather than from raw trig on matrix
//! entries, so rotate/uniform-scale chains decompose back to the angle
//! their construction implies.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod info;
mod stack;

pub use info::{TransformInfo, decompose, recompose};
pub use stack::TransformStack;

use kurbo::Affine;

/// Determinant magnitude below which a transform is treated as singular.
///
/// The threshold is deliberately loose compared to `f64::EPSILON`: a
/// transform this close to singular is already useless for editing (its
/// inverse explodes), so it is rejected rather than propagated.
pub const MIN_DETERMINANT: f64 = 1e-12;

/// Returns `true` if `affine` can be safely inverted.
#[must_use]
pub fn is_invertible(affine: Affine) -> bool {
    affine.determinant().abs() > MIN_DETERMINANT
}

/// Validates `affine` for use as a leaf-local transform.
///
/// Returns `Some(affine)` unchanged when the transform is invertible and
/// `None` when it is singular (zero or near-zero determinant). Callers are
/// expected to keep their previous transform on `None`; this is the only
/// validation gate on geometry edits.
#[must_use]
pub fn checked(affine: Affine) -> Option<Affine> {
    is_invertible(affine).then_some(affine)
}

/// Composes `affine` with itself `n` times.
///
/// `n = 0` yields the identity, `n = 1` yields `affine` itself. This is
/// the cumulative frame of a branch instance at recursion depth `n`: the
/// spawn point's transform applied once per recursion step.
///
/// The chain is evaluated as a plain left fold. Depth is bounded by the
/// identity registry's 10-bit depth field (at most 1023 compositions), so
/// there is no need for exponentiation by squaring here.
#[must_use]
pub fn self_compose(affine: Affine, n: u32) -> Affine {
    let mut out = Affine::IDENTITY;
    for _ in 0..n {
        out = out * affine;
    }
    out
}
