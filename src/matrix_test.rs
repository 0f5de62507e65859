#![allow(clippy::float_cmp)]

use super::*;
use std::f32::consts::FRAC_PI_2;

const EPSILON: f32 = 1e-6;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec4, b: Vec4) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z) && approx_eq(a.w, b.w)
}

#[test]
fn default_is_identity() {
    assert_eq!(Matrix4::default(), Matrix4::IDENTITY);
}

#[test]
fn identity_is_neutral_for_concat() {
    let m = Matrix4::IDENTITY.rotate_y(0.3).scale(Vec3::new(2.0, 3.0, 4.0));
    assert_eq!(m.concat(&Matrix4::IDENTITY), m);
    assert_eq!(Matrix4::IDENTITY.concat(&m), m);
}

#[test]
fn concat_is_row_by_column_product() {
    let a = Matrix4::from_array([
        1.0, 2.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);
    let b = Matrix4::from_array([
        1.0, 0.0, 0.0, 0.0, //
        3.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);
    let ab = a.concat(&b);
    assert_eq!(ab.at(0, 0), 7.0);
    assert_eq!(ab.at(0, 1), 2.0);
    assert_eq!(ab.at(1, 0), 3.0);
    let ba = b.concat(&a);
    assert_eq!(ba.at(1, 1), 7.0);
}

#[test]
fn with_sets_single_element() {
    let m = Matrix4::IDENTITY.with(2, 3, 0.5);
    assert_eq!(m.at(2, 3), 0.5);
    assert_eq!(m.as_array()[11], 0.5);
    assert_eq!(m.at(3, 2), 0.0);
}

#[test]
fn translate_places_offsets_in_last_column() {
    let m = Matrix4::IDENTITY.translate(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(m.at(0, 3), 1.0);
    assert_eq!(m.at(1, 3), 2.0);
    assert_eq!(m.at(2, 3), 3.0);
}

#[test]
fn translate_x_feeds_w_from_x_in_shader_space() {
    // 着色器按列主序读取：第 0 行第 3 列在 GPU 侧成为 w += t * x
    let m = Matrix4::IDENTITY.translate_x(0.5);
    let p = m.project(Vec3::new(2.0, 0.0, 0.0));
    assert!(vec_approx_eq(p, Vec4::new(2.0, 0.0, 0.0, 2.0)));
}

#[test]
fn scale_is_diagonal() {
    let m = Matrix4::IDENTITY.scale(Vec3::new(2.0, -1.0, 0.5));
    let p = m.project(Vec3::new(1.0, 1.0, 1.0));
    assert!(vec_approx_eq(p, Vec4::new(2.0, -1.0, 0.5, 1.0)));
}

#[test]
fn scale_uniform_scales_xyz_only() {
    let m = Matrix4::IDENTITY.scale_uniform(3.0);
    let p = m.project(Vec3::new(1.0, 2.0, 3.0));
    assert!(vec_approx_eq(p, Vec4::new(3.0, 6.0, 9.0, 1.0)));
}

#[test]
fn rotations_preserve_length() {
    let v = Vec3::new(0.3, -0.4, 0.5);
    for m in [
        Matrix4::IDENTITY.rotate_x(1.1),
        Matrix4::IDENTITY.rotate_y(-0.7),
        Matrix4::IDENTITY.rotate_z(2.9),
    ] {
        let p = m.project(v);
        assert!(approx_eq(p.truncate().length(), v.length()));
        assert!(approx_eq(p.w, 1.0));
    }
}

#[test]
fn rotate_y_quarter_turn_in_shader_space() {
    let p = Matrix4::IDENTITY.rotate_y(FRAC_PI_2).project(Vec3::X);
    assert!(vec_approx_eq(p, Vec4::new(0.0, 0.0, 1.0, 1.0)));
}

#[test]
fn rotate_x_quarter_turn_in_shader_space() {
    let p = Matrix4::IDENTITY.rotate_x(FRAC_PI_2).project(Vec3::Y);
    assert!(vec_approx_eq(p, Vec4::new(0.0, 0.0, -1.0, 1.0)));
}

#[test]
fn rotate_z_quarter_turn_in_shader_space() {
    let p = Matrix4::IDENTITY.rotate_z(FRAC_PI_2).project(Vec3::X);
    assert!(vec_approx_eq(p, Vec4::new(0.0, -1.0, 0.0, 1.0)));
}

#[test]
fn chain_applies_first_operation_first() {
    // 先旋转再缩放：X 轴先转到 Z，再被 z 缩放
    let m = Matrix4::IDENTITY.rotate_y(FRAC_PI_2).scale(Vec3::new(1.0, 1.0, 5.0));
    let p = m.project(Vec3::X);
    assert!(vec_approx_eq(p, Vec4::new(0.0, 0.0, 5.0, 1.0)));
}

#[test]
fn to_mat4_reads_array_column_major() {
    let m = Matrix4::IDENTITY.with(0, 1, 9.0);
    let g = m.to_mat4();
    assert_eq!(g.col(0).y, 9.0);
}
