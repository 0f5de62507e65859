// projection.rs - 相机状态 -> 裁剪空间矩阵

#[cfg(test)]
#[path = "projection_test.rs"]
mod projection_test;

use crate::camera::Ptz;
use crate::matrix::Matrix4;
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

/// Each whole zoom step scales the sphere by 50%.
pub const ZOOM_BASE: f32 = 1.5;

/// Offset along the shader's depth axis applied last.
const DEPTH_OFFSET: f32 = -0.1;

/// Sphere radius in pixels; doubles as the focal length.
pub fn radius(zoom: f32, viewport_width: u32) -> f32 {
    viewport_width as f32 * (ZOOM_BASE.ln() * zoom).exp()
}

/// Builds the vertex transform for one frame.
///
/// Order: rotate about Y by `pan - π/2`, rotate about X by `-tilt`, apply the
/// perspective shear (`perspective_rate` at row 2, col 3), scale by the radius,
/// scale into the viewport (`-1/w`, `1/h`, `1/radius`) and finally translate Z.
///
/// Returns `None` for an empty viewport.
pub fn build(ptz: Ptz, viewport_width: u32, viewport_height: u32, perspective_rate: f32) -> Option<Matrix4> {
    if viewport_width == 0 || viewport_height == 0 {
        return None;
    }

    let r = radius(ptz.zoom, viewport_width);
    if !(r > 0.0) || !r.is_finite() {
        return None;
    }

    let w = viewport_width as f32;
    let h = viewport_height as f32;
    let shear = Matrix4::IDENTITY.with(2, 3, perspective_rate);

    let m = Matrix4::IDENTITY
        .rotate_y(ptz.pan - FRAC_PI_2)
        .rotate_x(-ptz.tilt)
        .concat(&shear)
        .scale_uniform(r)
        .scale(Vec3::new(-1.0 / w, 1.0 / h, 1.0 / r))
        .translate_z(DEPTH_OFFSET);
    Some(m)
}
