// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coppice Scene: the recursive branch/leaf scene graph.
//!
//! A scene is a [`Tree`] of [`Branch`]es; a branch is an ordered set of
//! [`Leaf`] shapes of which exactly one is the *spawn point*. Drawing a
//! branch draws its leaves in order, and at the spawn point recursively
//! draws the *entire branch again* inside the spawn point's local
//! transform, up to a configurable iteration budget. The result is a
//! self-similar fractal unfolded purely through transform state: no
//! matter the requested depth, one physical copy of the leaf list exists.
//!
//! Three design decisions shape the API:
//!
//! - **Closed shape union.** Leaves are a tagged union over
//!   {spawn point, circle, line, rectangle, path} with one `match`-
//!   dispatched operation set ([`Geometry`]), not an open trait
//!   hierarchy: the editor's capabilities are per-kind and enumerable.
//! - **Arena, not back-references.** Leaves live in the identity
//!   registry ([`coppice_ident::LeafRegistry`]); branches hold ordered
//!   keys and every operation takes the registry (and clock, and
//!   surfaces) explicitly. Nothing in the scene points back at its
//!   owner.
//! - **Two surfaces, one pass.** Every frame draws real appearance into
//!   the visible surface and — in [`Mode::Edit`] — flat pick silhouettes
//!   into the identity buffer, through the same
//!   [`Surface`](coppice_imaging::Surface) contract.
//!
//! Render timing is instrumented per branch instance through the
//! [`Clock`] seam and aggregated into capped rolling windows
//! ([`TreeStatistics`]), for the editor's performance readout.
//!
//! This crate is `no_std` and uses `alloc`; the `std` feature (default)
//! additionally provides [`StdClock`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod branch;
mod leaf;
mod stats;
mod tree;

pub use branch::{AddShapeError, Branch};
pub use leaf::{Geometry, Leaf, LeafKind, MIN_PATH_POINTS};
pub use stats::{
    BranchStatistics, Clock, ManualClock, MAX_STAT_SAMPLES, StatsSnapshot, TreeStatistics,
};
pub use tree::Tree;

#[cfg(feature = "std")]
pub use stats::StdClock;

/// Interaction mode of the editor.
///
/// View mode is for looking: panning, zooming, changing the draw depth.
/// Edit mode additionally renders the identity buffer each frame so
/// clicks can resolve to a (leaf, depth) pair for selection and editing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Read-only viewing; no pick buffer is rendered.
    #[default]
    View,
    /// Interactive editing; the pick buffer tracks every frame.
    Edit,
}
