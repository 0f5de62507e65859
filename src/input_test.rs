#![allow(clippy::float_cmp)]

use super::*;
use crate::config::ViewerConfig;

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn camera() -> Camera {
    let mut cam = Camera::new(&ViewerConfig::default());
    cam.set_viewport(640, 360);
    cam
}

/// radius 640, rate 2
fn px(delta: f32) -> f32 {
    delta / 640.0 * 2.0
}

// --- mouse ---

#[test]
fn mouse_drag_pans_and_tilts() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.mouse_down(&mut cam, 100.0, 100.0);
    assert!(cam.is_dragging());
    g.mouse_move(&mut cam, 132.0, 84.0, false);
    assert!(approx_eq(cam.ptz().pan, px(32.0)));
    assert!(approx_eq(cam.ptz().tilt, px(-16.0)));
    assert_eq!(cam.ptz().zoom, 0.0);
}

#[test]
fn mouse_deltas_are_incremental() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.mouse_down(&mut cam, 0.0, 0.0);
    g.mouse_move(&mut cam, 10.0, 0.0, false);
    g.mouse_move(&mut cam, 30.0, 0.0, false);
    assert!(approx_eq(cam.ptz().pan, px(30.0)));
}

#[test]
fn modifier_drag_zooms_from_vertical_motion() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.mouse_down(&mut cam, 0.0, 0.0);
    g.mouse_move(&mut cam, 50.0, 64.0, true);
    assert_eq!(cam.ptz().pan, 0.0);
    assert!(approx_eq(cam.ptz().zoom, px(64.0)));
}

#[test]
fn hover_without_press_does_nothing() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.mouse_move(&mut cam, 50.0, 50.0, false);
    assert_eq!(cam.ptz().pan, 0.0);
    assert!(!g.is_active());
}

#[test]
fn mouse_up_ends_drag() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.mouse_down(&mut cam, 0.0, 0.0);
    g.mouse_up(&mut cam);
    assert!(!cam.is_dragging());
    assert!(!g.is_active());
    g.mouse_move(&mut cam, 10.0, 0.0, false);
    assert_eq!(cam.ptz().pan, 0.0);
}

#[test]
fn wheel_zooms_without_drag() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.wheel(&mut cam, 100.0);
    assert!(approx_eq(cam.ptz().zoom, px(10.0)));
    assert!(!cam.is_dragging());
}

// --- touch ---

#[test]
fn single_touch_pans_and_tilts() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.touch_start(&mut cam, 1, 10.0, 10.0);
    assert!(cam.is_dragging());
    g.touch_move(&mut cam, 1, 30.0, 20.0);
    assert!(approx_eq(cam.ptz().pan, px(20.0)));
    assert!(approx_eq(cam.ptz().tilt, px(10.0)));
}

#[test]
fn pinch_zooms_by_distance_change() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.touch_start(&mut cam, 1, 0.0, 0.0);
    g.touch_start(&mut cam, 2, 100.0, 0.0);
    // 第二根手指加入后的首次移动只刷新参考点
    g.touch_move(&mut cam, 2, 100.0, 0.0);
    assert_eq!(cam.ptz().zoom, 0.0);
    g.touch_move(&mut cam, 2, 164.0, 0.0);
    assert!(approx_eq(cam.ptz().zoom, px(64.0)));
    assert_eq!(cam.ptz().pan, 0.0);
}

#[test]
fn gesture_ends_when_last_finger_lifts() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.touch_start(&mut cam, 1, 0.0, 0.0);
    g.touch_start(&mut cam, 2, 10.0, 0.0);
    g.touch_end(&mut cam, 1);
    assert!(cam.is_dragging());
    g.touch_end(&mut cam, 2);
    assert!(!cam.is_dragging());
    assert!(!g.is_active());
}

#[test]
fn mismatched_finger_counts_only_rebase() {
    let mut cam = camera();
    let mut g = GestureTracker::new();
    g.touch_start(&mut cam, 1, 0.0, 0.0);
    g.touch_start(&mut cam, 2, 50.0, 0.0);
    g.touch_move(&mut cam, 2, 50.0, 0.0);
    g.touch_end(&mut cam, 2);
    // 两指参考 -> 单指当前：不产生增量
    g.touch_move(&mut cam, 1, 40.0, 0.0);
    assert_eq!(cam.ptz().pan, 0.0);
    g.touch_move(&mut cam, 1, 60.0, 0.0);
    assert!(approx_eq(cam.ptz().pan, px(20.0)));
}
