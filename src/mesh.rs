// mesh.rs - 球面三角带网格生成
//
// 整个球是一条螺旋状的三角带：每个纬度带内纬度随经度线性抬升，
// 使下一带的起点与上一带的终点相接。两极处固定纬度偏移，避免接缝撕裂。

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;

use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    /// Point on the unit sphere.
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub h_div: u32,
    pub v_div: u32,
    pub vertices: Vec<SphereVertex>,
}

impl SphereMesh {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Flat xyz stream for the position attribute.
    pub fn positions(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.position).collect()
    }

    /// Flat uv stream for the texcoord attribute.
    pub fn uvs(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.uv).collect()
    }
}

/// Latitude offsets of the two strip vertices emitted for cell `(h, v)`.
///
/// The first band pins its lower edge to 0 and the last band pins its upper
/// edge to 1 so each pole collapses onto a single texture row.
pub fn v_offsets(h: u32, v: u32, h_div: u32, v_div: u32) -> (f32, f32) {
    let lift = h as f32 / h_div as f32;
    let lower = if v == 0 { 0.0 } else { lift };
    let upper = if v == v_div - 1 { 1.0 } else { lift + 1.0 };
    (lower, upper)
}

fn strip_vertex(h: u32, v: u32, v_offset: f32, h_div: u32, v_div: u32) -> SphereVertex {
    let p = TAU * h as f32 / h_div as f32;
    let t = PI * ((v as f32 + v_offset) / v_div as f32 - 0.5);
    // 线性 -> 正弦，顶点向两极加密
    let t = t.sin() * FRAC_PI_2;

    let position = Vec3::new(p.cos() * t.cos(), t.sin(), p.sin() * t.cos());
    let uv = Vec2::new(p / TAU + v as f32, 1.0 - (t / PI + 0.5));

    SphereVertex {
        position: position.to_array(),
        uv: uv.to_array(),
    }
}

/// Builds the `2 * h_div * v_div` vertex strip. Both counts must be non-zero.
pub fn generate(h_div: u32, v_div: u32) -> SphereMesh {
    let mut vertices = Vec::with_capacity(2 * h_div as usize * v_div as usize);

    for v in 0..v_div {
        for h in 0..h_div {
            let (lower, upper) = v_offsets(h, v, h_div, v_div);
            vertices.push(strip_vertex(h, v, lower, h_div, v_div));
            vertices.push(strip_vertex(h, v, upper, h_div, v_div));
        }
    }

    SphereMesh {
        h_div,
        v_div,
        vertices,
    }
}
