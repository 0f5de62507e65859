// renderer.rs - wgpu 后端 (窗口表面 / 着色器 / 三角带绘制)

use crate::error::ViewerError;
use crate::gpu::{
    BufferHandle, GpuBackend, ProgramHandle, TextureFilter, TextureHandle, ATTRIBUTE_SLOTS, MATRIX_UNIFORM,
};
use crate::matrix::Matrix4;
use crate::texture::PLACEHOLDER_PIXEL;
use image::RgbaImage;
use std::borrow::Cow;
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct Program {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    // 与 ATTRIBUTE_SLOTS 一一对应
    vertex_buffers: Vec<Option<BufferHandle>>,
    texture: Option<TextureHandle>,
    bind_group: Option<wgpu::BindGroup>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    filter: TextureFilter,
}

/// [`GpuBackend`] over a winit window surface.
pub struct WgpuBackend {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    programs: Vec<Program>,
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<GpuTexture>,
}

impl WgpuBackend {
    /// Fails with `UnsupportedBackend` when no surface, adapter or device can be had.
    ///
    /// `window` must outlive the backend.
    pub async fn new(window: &Window) -> Result<Self, ViewerError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window) }
            .map_err(|e| ViewerError::UnsupportedBackend(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ViewerError::UnsupportedBackend("no compatible adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default().using_resolution(adapter.limits())
                    },
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| ViewerError::UnsupportedBackend(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::UnsupportedBackend("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!("wgpu adapter: {} ({:?})", info.name, info.backend);

        let depth_view = create_depth_view(&device, &config);
        let linear_sampler = create_sampler(&device, wgpu::FilterMode::Linear);
        let nearest_sampler = create_sampler(&device, wgpu::FilterMode::Nearest);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            linear_sampler,
            nearest_sampler,
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
        })
    }

    /// Re-applies the current surface configuration, e.g. after `SurfaceError::Lost`.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn create_module(&self, label: &str, source: &str) -> Result<wgpu::ShaderModule, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(module),
        }
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Result<&mut Program, ViewerError> {
        self.programs
            .get_mut(program.0)
            .ok_or(ViewerError::InvalidHandle("program"))
    }

    fn texture(&self, texture: TextureHandle) -> Result<&GpuTexture, ViewerError> {
        self.textures
            .get(texture.0)
            .ok_or(ViewerError::InvalidHandle("texture"))
    }

    /// Rebuilds the bind group of every program sampling `texture`.
    fn refresh_bind_groups(&mut self, texture: TextureHandle) -> Result<(), ViewerError> {
        let tex = self
            .textures
            .get(texture.0)
            .ok_or(ViewerError::InvalidHandle("texture"))?;
        let sampler = match tex.filter {
            TextureFilter::Linear => &self.linear_sampler,
            TextureFilter::Nearest => &self.nearest_sampler,
        };
        for program in self.programs.iter_mut().filter(|p| p.texture == Some(texture)) {
            let group = create_bind_group(&self.device, program, tex, sampler);
            program.bind_group = Some(group);
        }
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<ProgramHandle, ViewerError> {
        let vertex = self
            .create_module("vertex_shader", vertex_source)
            .map_err(ViewerError::ShaderCompile)?;
        let fragment = self
            .create_module("fragment_shader", fragment_source)
            .map_err(ViewerError::ShaderCompile)?;

        let bind_group_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    // uMatrix
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("panorama_bind_group_layout"),
        });

        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // 每个属性独占一个顶点缓冲
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = ATTRIBUTE_SLOTS
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: vertex_format(a.components),
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout> = ATTRIBUTE_SLOTS
            .iter()
            .zip(&attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: (a.components as usize * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: "vs_main",
                buffers: &vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // 从球内部观看，两面都要画
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ViewerError::ProgramLink(err.to_string()));
        }

        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Matrix Buffer"),
            contents: bytemuck::cast_slice(Matrix4::IDENTITY.as_array().as_slice()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        self.programs.push(Program {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            vertex_buffers: vec![None; ATTRIBUTE_SLOTS.len()],
            texture: None,
            bind_group: None,
        });
        log::info!("shader program compiled");
        Ok(ProgramHandle(self.programs.len() - 1))
    }

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferHandle, ViewerError> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.buffers.push(buffer);
        Ok(BufferHandle(self.buffers.len() - 1))
    }

    fn bind_vertex_attribute(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        name: &str,
        component_count: u32,
    ) -> Result<(), ViewerError> {
        if buffer.0 >= self.buffers.len() {
            return Err(ViewerError::InvalidHandle("buffer"));
        }
        let index = ATTRIBUTE_SLOTS
            .iter()
            .position(|a| a.name == name && a.components == component_count)
            .ok_or_else(|| ViewerError::UnknownAttribute(format!("{name} with {component_count} components")))?;
        self.program_mut(program)?.vertex_buffers[index] = Some(buffer);
        Ok(())
    }

    fn create_texture(&mut self) -> Result<TextureHandle, ViewerError> {
        let (texture, view) = create_rgba_texture(&self.device, &self.queue, 1, 1, &PLACEHOLDER_PIXEL);
        self.textures.push(GpuTexture {
            texture,
            view,
            filter: TextureFilter::Linear,
        });
        Ok(TextureHandle(self.textures.len() - 1))
    }

    fn bind_texture(&mut self, program: ProgramHandle, texture: TextureHandle) -> Result<(), ViewerError> {
        self.texture(texture)?;
        self.program_mut(program)?.texture = Some(texture);
        self.refresh_bind_groups(texture)
    }

    fn upload_image(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), ViewerError> {
        self.texture(texture)?;

        // 超过 GPU 纹理尺寸限制时按比例缩小
        let max_texture_dimension = self.max_texture_size();
        let (src_w, src_h) = image.dimensions();
        let scaled;
        let image = if src_w > max_texture_dimension || src_h > max_texture_dimension {
            let scale = (max_texture_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = ((src_w as f32 * scale) as u32).max(1);
            let new_h = ((src_h as f32 * scale) as u32).max(1);
            log::warn!("image {src_w}x{src_h} exceeds GPU limit {max_texture_dimension}, scaling to {new_w}x{new_h}");
            scaled = image::imageops::resize(image, new_w, new_h, image::imageops::FilterType::Lanczos3);
            &scaled
        } else {
            image
        };

        let (width, height) = image.dimensions();
        let (new_texture, view) = create_rgba_texture(&self.device, &self.queue, width, height, image);
        let slot = &mut self.textures[texture.0];
        slot.texture.destroy();
        slot.texture = new_texture;
        slot.view = view;
        self.refresh_bind_groups(texture)
    }

    fn set_filter_mode(&mut self, texture: TextureHandle, filter: TextureFilter) -> Result<(), ViewerError> {
        let slot = self
            .textures
            .get_mut(texture.0)
            .ok_or(ViewerError::InvalidHandle("texture"))?;
        if slot.filter == filter {
            return Ok(());
        }
        slot.filter = filter;
        self.refresh_bind_groups(texture)
    }

    fn set_uniform_matrix4(&mut self, program: ProgramHandle, name: &str, matrix: &Matrix4) -> Result<(), ViewerError> {
        if name != MATRIX_UNIFORM {
            return Err(ViewerError::UnknownUniform(name.to_string()));
        }
        let program = self
            .programs
            .get(program.0)
            .ok_or(ViewerError::InvalidHandle("program"))?;
        self.queue
            .write_buffer(&program.uniform_buffer, 0, bytemuck::cast_slice(matrix.as_array().as_slice()));
        Ok(())
    }

    fn draw_triangle_strip(&mut self, program: ProgramHandle, vertex_count: u32) -> Result<(), ViewerError> {
        let program = self
            .programs
            .get(program.0)
            .ok_or(ViewerError::InvalidHandle("program"))?;
        let bind_group = program
            .bind_group
            .as_ref()
            .ok_or(ViewerError::InvalidHandle("texture"))?;
        let vertex_buffers = program
            .vertex_buffers
            .iter()
            .zip(ATTRIBUTE_SLOTS.iter())
            .map(|(handle, slot)| {
                handle
                    .and_then(|h| self.buffers.get(h.0))
                    .ok_or_else(|| ViewerError::UnknownAttribute(format!("{} has no buffer", slot.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            for (slot, buffer) in vertex_buffers.iter().enumerate() {
                render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            render_pass.draw(0..vertex_count, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn create_sampler(device: &wgpu::Device, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("panorama_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat, // u 按纬度带累加，需要水平循环
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some("panorama_texture"),
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_bind_group(
    device: &wgpu::Device,
    program: &Program,
    texture: &GpuTexture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &program.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: program.uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("panorama_bind_group"),
    })
}
