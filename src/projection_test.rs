#![allow(clippy::float_cmp)]

use super::*;
use glam::Vec4;

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn ptz(pan: f32, tilt: f32, zoom: f32) -> Ptz {
    Ptz { pan, tilt, zoom }
}

fn assert_clip(actual: Vec4, expected: Vec4) {
    assert!(
        approx_eq(actual.x, expected.x)
            && approx_eq(actual.y, expected.y)
            && approx_eq(actual.z, expected.z)
            && approx_eq(actual.w, expected.w),
        "{actual:?} != {expected:?}"
    );
}

// --- radius ---

#[test]
fn radius_at_zoom_zero_is_viewport_width() {
    assert_eq!(radius(0.0, 640), 640.0);
}

#[test]
fn radius_grows_by_half_per_zoom_step() {
    assert!(approx_eq(radius(1.0, 100) / 100.0, 1.5));
    assert!(approx_eq(radius(-1.0, 100) * 1.5 / 100.0, 1.0));
}

#[test]
fn radius_is_proportional_to_width() {
    for zoom in [-3.0, -0.5, 0.0, 2.25] {
        assert!(approx_eq(radius(zoom, 1280) / radius(zoom, 640), 2.0));
    }
}

// --- build ---

#[test]
fn empty_viewport_yields_no_matrix() {
    assert!(build(ptz(0.0, 0.0, 0.0), 0, 360, 1.0).is_none());
    assert!(build(ptz(0.0, 0.0, 0.0), 640, 0, 1.0).is_none());
}

#[test]
fn forward_direction_lands_at_screen_centre() {
    let m = build(ptz(0.0, 0.0, 0.0), 640, 360, 1.0).unwrap();
    let clip = m.project(Vec3::new(-1.0, 0.0, 0.0));
    assert_clip(clip, Vec4::new(0.0, 0.0, 1.0, 1.9));
}

#[test]
fn perspective_rate_feeds_w_from_depth() {
    let m = build(ptz(0.0, 0.0, 0.0), 640, 360, 0.5).unwrap();
    let clip = m.project(Vec3::new(-1.0, 0.0, 0.0));
    assert!(approx_eq(clip.w, 1.0 + 0.5 - 0.1));
}

#[test]
fn zenith_scales_by_radius_over_height() {
    let m = build(ptz(0.0, 0.0, 0.0), 640, 360, 1.0).unwrap();
    let clip = m.project(Vec3::Y);
    assert_clip(clip, Vec4::new(0.0, 640.0 / 360.0, 0.0, 1.0));
}

#[test]
fn zoom_scales_image_plane() {
    let m0 = build(ptz(0.0, 0.0, 0.0), 640, 360, 1.0).unwrap();
    let m1 = build(ptz(0.0, 0.0, 1.0), 640, 360, 1.0).unwrap();
    let y0 = m0.project(Vec3::Y).y;
    let y1 = m1.project(Vec3::Y).y;
    assert!(approx_eq(y1 / y0, 1.5));
}

#[test]
fn horizontal_axis_is_mirrored() {
    // 从球内部观看，x 需要翻转
    let m = build(ptz(0.0, 0.0, 0.0), 640, 360, 1.0).unwrap();
    let clip = m.project(Vec3::Z);
    assert_clip(clip, Vec4::new(-1.0, 0.0, 0.0, 1.0));
}

#[test]
fn quarter_pan_faces_positive_z() {
    let m = build(ptz(FRAC_PI_2, 0.0, 0.0), 640, 360, 1.0).unwrap();
    let clip = m.project(Vec3::Z);
    assert_clip(clip, Vec4::new(0.0, 0.0, 1.0, 1.9));
}

#[test]
fn positive_tilt_looks_up() {
    let t = 0.5f32;
    let m = build(ptz(0.0, t, 0.0), 640, 360, 1.0).unwrap();
    let clip = m.project(Vec3::new(-t.cos(), t.sin(), 0.0));
    assert_clip(clip, Vec4::new(0.0, 0.0, 1.0, 1.9));
}

#[test]
fn build_is_pure() {
    let a = build(ptz(0.3, -0.2, 1.7), 800, 600, 1.0);
    let b = build(ptz(0.3, -0.2, 1.7), 800, 600, 1.0);
    assert_eq!(a, b);
}
