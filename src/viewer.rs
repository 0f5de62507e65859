// viewer.rs - 查看器外观：配置 + 相机 + 绘制流程

use crate::camera::{Camera, Ptz};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::gpu::GpuBackend;
use crate::mesh::{self, SphereMesh};
use crate::pipeline::ScenePipeline;
use crate::texture;
use image::DynamicImage;

/// A spherical panorama viewer driven by host input and a host frame clock.
pub struct Viewer<B: GpuBackend> {
    config: ViewerConfig,
    camera: Camera,
    scene: ScenePipeline<B>,
    mesh: SphereMesh,
    last_frame_ms: Option<f64>,
    fullscreen: bool,
}

impl<B: GpuBackend> Viewer<B> {
    /// Validates `config` before touching the backend, then prepares the scene.
    pub fn new(mut backend: B, config: ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;

        let mesh = mesh::generate(config.h_div, config.v_div);
        backend.resize_viewport(config.width, config.height);
        let scene = ScenePipeline::new(backend, &mesh, config.perspective_rate)?;

        let mut camera = Camera::new(&config);
        camera.set_viewport(config.width, config.height);

        let mut viewer = Self {
            config,
            camera,
            scene,
            mesh,
            last_frame_ms: None,
            fullscreen: false,
        };
        if viewer.config.debug_texture {
            let size = viewer.texture_size();
            viewer.load_rgba(&texture::debug_image(size))?;
        }
        Ok(viewer)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn scene(&self) -> &ScenePipeline<B> {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        self.scene.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.scene.backend_mut()
    }

    pub fn set_ptz(&mut self, pan: f32, tilt: f32, zoom: f32) {
        self.camera.set_ptz(pan, tilt, zoom);
    }

    pub fn ptz(&self) -> Ptz {
        self.camera.ptz()
    }

    pub fn begin_drag(&mut self) {
        self.camera.begin_drag();
    }

    pub fn end_drag(&mut self) {
        self.camera.end_drag();
    }

    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32, pinch: Option<f32>) {
        self.camera.apply_pointer_delta(dx, dy, pinch);
    }

    pub fn advance(&mut self, dt_seconds: f32) {
        self.camera.advance(dt_seconds);
    }

    /// Flips the fullscreen flag and returns the new state; the host resizes its window.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        log::info!("fullscreen {}", if self.fullscreen { "on" } else { "off" });
        self.fullscreen
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Texture edge for this backend and config.
    pub fn texture_size(&self) -> u32 {
        texture::texture_size(self.backend().max_texture_size(), self.config.max_texture_size)
    }

    /// Fits `img` to the texture size and shows it.
    pub fn load_image(&mut self, img: DynamicImage) -> Result<(), ViewerError> {
        let fitted = texture::fit_equirect(img, self.texture_size());
        self.load_rgba(&fitted)
    }

    fn load_rgba(&mut self, img: &image::RgbaImage) -> Result<(), ViewerError> {
        self.scene.upload_image(img)?;
        self.camera.mark_dirty();
        Ok(())
    }

    /// Applies a viewport size, resizing the backend when it changed. Returns whether it changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.camera.set_viewport(width, height) {
            return false;
        }
        log::debug!("viewport {width}x{height}");
        if width > 0 && height > 0 {
            self.scene.backend_mut().resize_viewport(width, height);
        }
        true
    }

    /// Draws if anything changed since the last frame. Returns whether it drew.
    pub fn render(&mut self) -> Result<bool, ViewerError> {
        self.scene.render(&mut self.camera)
    }

    /// One host frame at timestamp `now_ms`.
    ///
    /// The first frame only records the timestamp; later frames advance motion by
    /// the elapsed time, then pick up the current viewport and render if needed.
    pub fn frame(&mut self, now_ms: f64, width: u32, height: u32) -> Result<bool, ViewerError> {
        if let Some(last) = self.last_frame_ms {
            let dt = ((now_ms - last) / 1000.0).max(0.0);
            self.camera.advance(dt as f32);
        }
        self.last_frame_ms = Some(now_ms);

        self.resize(width, height);
        self.render()
    }
}
