// pipeline.rs - 场景绘制流程：一次性准备资源，脏时重绘

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

use crate::camera::Camera;
use crate::error::ViewerError;
use crate::gpu::{
    BufferHandle, GpuBackend, ProgramHandle, TextureFilter, TextureHandle, MATRIX_UNIFORM, POSITION_ATTRIBUTE,
    TEXCOORD_ATTRIBUTE,
};
use crate::mesh::SphereMesh;
use crate::projection;
use image::RgbaImage;

pub const VERTEX_SHADER: &str = r#"
@group(0) @binding(0) var<uniform> uMatrix: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
};

@vertex
fn vs_main(@location(0) aPosition: vec3<f32>, @location(1) aTexcoord: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    let p = uMatrix * vec4<f32>(aPosition, 1.0);
    // 矩阵按 GL 深度范围 [-w, w] 构造，这里映射到 [0, w]
    out.position = vec4<f32>(p.xy, (p.z + p.w) * 0.5, p.w);
    out.texcoord = aTexcoord;
    return out;
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
@group(0) @binding(1) var uTexture: texture_2d<f32>;
@group(0) @binding(2) var uSampler: sampler;

@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(uTexture, uSampler, texcoord);
}
"#;

/// Owns the GPU side of one sphere: program, vertex buffers, panorama texture.
pub struct ScenePipeline<B: GpuBackend> {
    backend: B,
    program: ProgramHandle,
    texture: TextureHandle,
    buffers: [BufferHandle; 2],
    vertex_count: u32,
    perspective_rate: f32,
    frames_drawn: u64,
}

impl<B: GpuBackend> ScenePipeline<B> {
    /// Compiles the program and uploads the mesh once.
    pub fn new(mut backend: B, mesh: &SphereMesh, perspective_rate: f32) -> Result<Self, ViewerError> {
        let program = backend.compile_program(VERTEX_SHADER, FRAGMENT_SHADER)?;

        let texture = backend.create_texture()?;
        backend.bind_texture(program, texture)?;

        let uvs = backend.create_buffer(&mesh.uvs())?;
        backend.bind_vertex_attribute(program, uvs, TEXCOORD_ATTRIBUTE, 2)?;

        let positions = backend.create_buffer(&mesh.positions())?;
        backend.bind_vertex_attribute(program, positions, POSITION_ATTRIBUTE, 3)?;

        log::info!(
            "scene ready: {} strip vertices ({}x{} divisions)",
            mesh.vertex_count(),
            mesh.h_div,
            mesh.v_div
        );

        Ok(Self {
            backend,
            program,
            texture,
            buffers: [positions, uvs],
            vertex_count: mesh.vertex_count(),
            perspective_rate,
            frames_drawn: 0,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Position and texcoord buffers, in that order.
    pub fn buffers(&self) -> [BufferHandle; 2] {
        self.buffers
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn upload_image(&mut self, image: &RgbaImage) -> Result<(), ViewerError> {
        self.backend.upload_image(self.texture, image)
    }

    /// Draws if the scene is dirty or nothing has been drawn yet. Returns whether it drew.
    ///
    /// An empty viewport skips the frame and leaves the scene dirty.
    pub fn render(&mut self, camera: &mut Camera) -> Result<bool, ViewerError> {
        if !camera.is_scene_dirty() && self.frames_drawn > 0 {
            return Ok(false);
        }

        let s = camera.state();
        let Some(matrix) = projection::build(camera.ptz(), s.viewport_width, s.viewport_height, self.perspective_rate)
        else {
            log::debug!("skipping frame for empty viewport");
            return Ok(false);
        };

        self.backend.set_filter_mode(self.texture, TextureFilter::Linear)?;
        self.backend.set_uniform_matrix4(self.program, MATRIX_UNIFORM, &matrix)?;
        self.backend.draw_triangle_strip(self.program, self.vertex_count)?;

        camera.clear_dirty();
        self.frames_drawn += 1;
        Ok(true)
    }
}
