// gpu.rs - 渲染后端接口
//
// 核心只通过这组最小能力与 GPU 交互；任何后端 (wgpu / 测试录制器) 实现它即可。

use crate::error::ViewerError;
use crate::matrix::Matrix4;
use image::RgbaImage;

pub const POSITION_ATTRIBUTE: &str = "aPosition";
pub const TEXCOORD_ATTRIBUTE: &str = "aTexcoord";
pub const MATRIX_UNIFORM: &str = "uMatrix";

/// A vertex input the viewer's shaders declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    pub name: &'static str,
    pub location: u32,
    pub components: u32,
}

/// Vertex inputs, one buffer per attribute. Backends bind by name through this table.
pub const ATTRIBUTE_SLOTS: [AttributeSlot; 2] = [
    AttributeSlot {
        name: POSITION_ATTRIBUTE,
        location: 0,
        components: 3,
    },
    AttributeSlot {
        name: TEXCOORD_ATTRIBUTE,
        location: 1,
        components: 2,
    },
];

pub fn attribute_slot(name: &str) -> Option<&'static AttributeSlot> {
    ATTRIBUTE_SLOTS.iter().find(|a| a.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

pub trait GpuBackend {
    /// Fails with `ShaderCompile` or `ProgramLink`, carrying the backend's diagnostics.
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramHandle, ViewerError>;

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferHandle, ViewerError>;

    fn bind_vertex_attribute(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        name: &str,
        component_count: u32,
    ) -> Result<(), ViewerError>;

    /// New texture holding a placeholder until an image is uploaded.
    fn create_texture(&mut self) -> Result<TextureHandle, ViewerError>;

    fn bind_texture(&mut self, program: ProgramHandle, texture: TextureHandle) -> Result<(), ViewerError>;

    fn upload_image(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), ViewerError>;

    fn set_filter_mode(&mut self, texture: TextureHandle, filter: TextureFilter) -> Result<(), ViewerError>;

    fn set_uniform_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Matrix4) -> Result<(), ViewerError>;

    /// Clears and draws one frame of `vertex_count` strip vertices.
    fn draw_triangle_strip(&mut self, program: ProgramHandle, vertex_count: u32) -> Result<(), ViewerError>;

    fn resize_viewport(&mut self, width: u32, height: u32);

    /// Largest texture edge the device accepts.
    fn max_texture_size(&self) -> u32;
}
