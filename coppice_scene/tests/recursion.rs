// Copyright 2026 the Coppice Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests of the recursive draw: statistics, composed marker
//! positions, and round-trip picking through a real pixel buffer.

use kurbo::{Affine, Point};

use coppice_imaging::{DrawOp, PixelSource, RecordSurface, StateOp, Surface};
use coppice_imaging_pix::PixSurface;
use coppice_scene::{Geometry, LeafKind, ManualClock, Mode, Tree};

const VIEW_SIZE: u32 = 400;

/// World origin mapped to the buffer center.
fn view() -> Affine {
    Affine::translate((f64::from(VIEW_SIZE) / 2.0, f64::from(VIEW_SIZE) / 2.0))
}

/// Draws one frame with the view transform pushed around the pass.
fn draw_frame(tree: &mut Tree, visible: &mut PixSurface, identity: &mut PixSurface) {
    let clock = ManualClock::new(1);
    visible.state(StateOp::PushTransform(view()));
    identity.state(StateOp::PushTransform(view()));
    tree.draw(visible, identity, &clock);
    visible.state(StateOp::PopTransform);
    identity.state(StateOp::PopTransform);
}

fn pixel_at(surface: &PixSurface, device: Point) -> u32 {
    surface
        .rgb24_at(device.x.floor() as i32, device.y.floor() as i32)
        .expect("probe point inside the buffer")
}

#[test]
fn depth_three_scenario_yields_three_samples_and_composed_markers() {
    // One spawn point (translate(60,0) · rotate(-10°) · scale(0.98)) and
    // one circle of radius 15 attached to the branch.
    let mut tree = Tree::new(3).expect("build tree");
    let circle = tree
        .add_shape(LeafKind::Circle, Point::ORIGIN, 1.0)
        .expect("add circle");
    tree.leaf_mut(circle)
        .expect("live")
        .set_radius(15.0);

    let spawn_t = tree.spawn_transform();
    let clock = ManualClock::new(1);
    let mut visible = RecordSurface::new();
    let mut identity = RecordSurface::new();

    let frame = tree.draw(&mut visible, &mut identity, &clock);
    assert_eq!(frame.num_branches, 3);
    assert_eq!(frame.branch_micros.len(), 3);

    // The three branch instances draw the circle under the composed
    // frames identity, T, and T²; the spawn marker sits one further
    // application deep in each instance.
    let circle_frames: Vec<Affine> = visible
        .draw_events()
        .filter(|(op, _)| matches!(op, DrawOp::FillEllipse { .. }))
        .map(|(_, at)| at)
        .collect();
    assert_eq!(circle_frames.len(), 3);

    let expected = [
        Affine::IDENTITY,
        spawn_t,
        spawn_t * spawn_t,
    ];
    // Draw order is deepest-content-first interleaved; compare as sets of
    // origin images to stay independent of interleaving.
    let mut positions: Vec<Point> = circle_frames.iter().map(|t| *t * Point::ORIGIN).collect();
    positions.sort_by(|a, b| a.x.total_cmp(&b.x));
    let mut wanted: Vec<Point> = expected.iter().map(|t| *t * Point::ORIGIN).collect();
    wanted.sort_by(|a, b| a.x.total_cmp(&b.x));
    for (got, want) in positions.iter().zip(&wanted) {
        assert!((*got - *want).hypot() < 1e-9, "{got:?} != {want:?}");
    }

    let markers = visible
        .draw_events()
        .filter(|(op, _)| matches!(op, DrawOp::StrokeEllipse { .. }))
        .count();
    assert_eq!(markers, 3, "one marker per branch instance");
}

#[test]
fn click_on_identity_buffer_resolves_leaf_and_depth() {
    let mut tree = Tree::sample(3).expect("build tree");
    tree.set_mode(Mode::Edit);

    let mut visible = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    let mut identity = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    draw_frame(&mut tree, &mut visible, &mut identity);

    // The demo branch's first circle sits at translate(-10,-10) with
    // radius 15; its depth-0 instance covers the device point below.
    let keys = tree.branch().leaves().to_vec();
    let green = keys[1];
    let center0 = view() * Point::new(-10.0, -10.0);

    let picked = tree
        .registry()
        .lookup(pixel_at(&identity, center0))
        .expect("circle covers its center");
    assert_eq!(picked, (green, 0));

    // The same leaf's depth-1 instance lives inside the spawn frame.
    let center1 = view() * tree.spawn_transform() * Point::new(-10.0, -10.0);
    let picked = tree
        .registry()
        .lookup(pixel_at(&identity, center1))
        .expect("depth-1 copy covers its center");
    assert_eq!(picked, (green, 1));

    // And the visible buffer really shows the circle's color there.
    assert_eq!(pixel_at(&visible, center0), 0x00_8000);
}

#[test]
fn deleting_a_leaf_releases_its_pixels_to_background_misses() {
    let mut tree = Tree::sample(2).expect("build tree");
    tree.set_mode(Mode::Edit);

    let mut visible = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    let mut identity = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    draw_frame(&mut tree, &mut visible, &mut identity);

    let green = tree.branch().leaves()[1];
    let probe = view() * Point::new(-10.0, -10.0);
    assert!(tree.registry().lookup(pixel_at(&identity, probe)).is_some());

    assert!(tree.delete_leaf(green));

    // Next frame: the region the circle covered is background again and
    // the stale key no longer resolves.
    visible.clear_background();
    identity.clear_background();
    draw_frame(&mut tree, &mut visible, &mut identity);
    assert_eq!(tree.registry().lookup(pixel_at(&identity, probe)), None);
}

#[test]
fn view_mode_keeps_the_identity_buffer_blank() {
    let mut tree = Tree::sample(2).expect("build tree");
    let mut visible = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    let mut identity = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    draw_frame(&mut tree, &mut visible, &mut identity);

    let probe = view() * Point::new(-10.0, -10.0);
    assert_eq!(pixel_at(&identity, probe), PixSurface::CLEAR_RGB);
    // The visible surface rendered regardless.
    assert_ne!(pixel_at(&visible, probe), PixSurface::CLEAR_RGB);
}

#[test]
fn added_path_is_pickable_and_editable() {
    let mut tree = Tree::new(1).expect("build tree");
    tree.set_mode(Mode::Edit);

    let key = tree
        .add_shape(LeafKind::Path, Point::new(-100.0, -100.0), 1.0)
        .expect("add path");

    let mut visible = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    let mut identity = PixSurface::new(VIEW_SIZE, VIEW_SIZE);
    draw_frame(&mut tree, &mut visible, &mut identity);

    // Probe the triangle's centroid.
    let Geometry::Path { points, .. } = tree.leaf(key).expect("live").geometry().clone() else {
        panic!("expected a path");
    };
    let centroid = Point::new(
        points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64,
        points.iter().map(|p| p.y).sum::<f64>() / points.len() as f64,
    );
    let device = view() * Affine::translate((-100.0, -100.0)) * centroid;
    let picked = tree
        .registry()
        .lookup(pixel_at(&identity, device))
        .expect("path covers its centroid");
    assert_eq!(picked, (key, 0));
}
