// headless.rs - 无 GPU 的录制后端 (测试 / 离线驱动)

use crate::error::ViewerError;
use crate::gpu::{
    attribute_slot, BufferHandle, GpuBackend, ProgramHandle, TextureFilter, TextureHandle, MATRIX_UNIFORM,
};
use crate::matrix::Matrix4;
use image::RgbaImage;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileProgram,
    CreateBuffer { len: usize },
    BindVertexAttribute { buffer: BufferHandle, name: String, components: u32 },
    CreateTexture,
    BindTexture(TextureHandle),
    UploadImage { width: u32, height: u32 },
    SetFilterMode(TextureFilter),
    SetUniformMatrix4(Matrix4),
    DrawTriangleStrip(u32),
    ResizeViewport(u32, u32),
}

/// Records every call and validates handles and names like a real backend would.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    pub calls: Vec<GpuCall>,
    pub max_texture_size: u32,
    programs: usize,
    buffers: Vec<usize>,
    textures: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl HeadlessBackend {
    pub fn new(max_texture_size: u32) -> Self {
        Self {
            calls: Vec::new(),
            max_texture_size,
            programs: 0,
            buffers: Vec::new(),
            textures: 0,
        }
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GpuCall::DrawTriangleStrip(_)))
            .count()
    }

    pub fn last_matrix(&self) -> Option<Matrix4> {
        self.calls.iter().rev().find_map(|c| match c {
            GpuCall::SetUniformMatrix4(m) => Some(*m),
            _ => None,
        })
    }

    fn check_program(&self, program: ProgramHandle) -> Result<(), ViewerError> {
        if program.0 < self.programs {
            Ok(())
        } else {
            Err(ViewerError::InvalidHandle("program"))
        }
    }

    fn check_texture(&self, texture: TextureHandle) -> Result<(), ViewerError> {
        if texture.0 < self.textures {
            Ok(())
        } else {
            Err(ViewerError::InvalidHandle("texture"))
        }
    }
}

impl GpuBackend for HeadlessBackend {
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramHandle, ViewerError> {
        if vertex_source.trim().is_empty() {
            return Err(ViewerError::ShaderCompile("empty vertex shader".into()));
        }
        if fragment_source.trim().is_empty() {
            return Err(ViewerError::ShaderCompile("empty fragment shader".into()));
        }
        self.calls.push(GpuCall::CompileProgram);
        self.programs += 1;
        Ok(ProgramHandle(self.programs - 1))
    }

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferHandle, ViewerError> {
        self.calls.push(GpuCall::CreateBuffer { len: data.len() });
        self.buffers.push(data.len());
        Ok(BufferHandle(self.buffers.len() - 1))
    }

    fn bind_vertex_attribute(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        name: &str,
        component_count: u32,
    ) -> Result<(), ViewerError> {
        self.check_program(program)?;
        let len = *self.buffers.get(buffer.0).ok_or(ViewerError::InvalidHandle("buffer"))?;
        let slot = attribute_slot(name).ok_or_else(|| ViewerError::UnknownAttribute(name.to_string()))?;
        if slot.components != component_count || len % component_count as usize != 0 {
            return Err(ViewerError::UnknownAttribute(format!("{name} with {component_count} components")));
        }
        self.calls.push(GpuCall::BindVertexAttribute {
            buffer,
            name: name.to_string(),
            components: component_count,
        });
        Ok(())
    }

    fn create_texture(&mut self) -> Result<TextureHandle, ViewerError> {
        self.calls.push(GpuCall::CreateTexture);
        self.textures += 1;
        Ok(TextureHandle(self.textures - 1))
    }

    fn bind_texture(&mut self, program: ProgramHandle, texture: TextureHandle) -> Result<(), ViewerError> {
        self.check_program(program)?;
        self.check_texture(texture)?;
        self.calls.push(GpuCall::BindTexture(texture));
        Ok(())
    }

    fn upload_image(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), ViewerError> {
        self.check_texture(texture)?;
        self.calls.push(GpuCall::UploadImage {
            width: image.width(),
            height: image.height(),
        });
        Ok(())
    }

    fn set_filter_mode(&mut self, texture: TextureHandle, filter: TextureFilter) -> Result<(), ViewerError> {
        self.check_texture(texture)?;
        self.calls.push(GpuCall::SetFilterMode(filter));
        Ok(())
    }

    fn set_uniform_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Matrix4) -> Result<(), ViewerError> {
        self.check_program(program)?;
        if name != MATRIX_UNIFORM {
            return Err(ViewerError::UnknownUniform(name.to_string()));
        }
        self.calls.push(GpuCall::SetUniformMatrix4(*matrix));
        Ok(())
    }

    fn draw_triangle_strip(&mut self, program: ProgramHandle, vertex_count: u32) -> Result<(), ViewerError> {
        self.check_program(program)?;
        self.calls.push(GpuCall::DrawTriangleStrip(vertex_count));
        Ok(())
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(GpuCall::ResizeViewport(width, height));
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }
}
