use super::*;
use crate::config::ViewerConfig;
use crate::gpu::BufferHandle;
use crate::headless::{GpuCall, HeadlessBackend};
use crate::matrix::Matrix4;
use crate::mesh;

fn scene(h_div: u32, v_div: u32) -> ScenePipeline<HeadlessBackend> {
    ScenePipeline::new(HeadlessBackend::default(), &mesh::generate(h_div, v_div), 1.0).unwrap()
}

fn camera() -> Camera {
    let mut cam = Camera::new(&ViewerConfig::default());
    cam.set_viewport(640, 360);
    cam
}

/// Backend whose shader compiler rejects everything.
struct RejectingCompiler;

impl GpuBackend for RejectingCompiler {
    fn compile_program(&mut self, _: &str, _: &str) -> Result<ProgramHandle, ViewerError> {
        Err(ViewerError::ShaderCompile("0:1: syntax error".into()))
    }
    fn create_buffer(&mut self, _: &[f32]) -> Result<BufferHandle, ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn bind_vertex_attribute(&mut self, _: ProgramHandle, _: BufferHandle, _: &str, _: u32) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn create_texture(&mut self) -> Result<TextureHandle, ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn bind_texture(&mut self, _: ProgramHandle, _: TextureHandle) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn upload_image(&mut self, _: TextureHandle, _: &RgbaImage) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn set_filter_mode(&mut self, _: TextureHandle, _: TextureFilter) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn set_uniform_matrix4(&mut self, _: ProgramHandle, _: &str, _: &Matrix4) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn draw_triangle_strip(&mut self, _: ProgramHandle, _: u32) -> Result<(), ViewerError> {
        unreachable!("no resources after a failed compile")
    }
    fn resize_viewport(&mut self, _: u32, _: u32) {}
    fn max_texture_size(&self) -> u32 {
        0
    }
}

#[test]
fn setup_compiles_once_and_uploads_both_streams() {
    let s = scene(4, 2);
    let calls = &s.backend().calls;
    assert_eq!(calls[0], GpuCall::CompileProgram);
    assert_eq!(calls.iter().filter(|c| **c == GpuCall::CompileProgram).count(), 1);
    assert!(calls.contains(&GpuCall::CreateBuffer { len: 16 * 3 }));
    assert!(calls.contains(&GpuCall::CreateBuffer { len: 16 * 2 }));
    let [positions, uvs] = s.buffers();
    assert!(calls.contains(&GpuCall::BindVertexAttribute {
        buffer: positions,
        name: POSITION_ATTRIBUTE.into(),
        components: 3,
    }));
    assert!(calls.contains(&GpuCall::BindVertexAttribute {
        buffer: uvs,
        name: TEXCOORD_ATTRIBUTE.into(),
        components: 2,
    }));
    assert!(calls.contains(&GpuCall::BindTexture(s.texture())));
    assert_eq!(s.backend().draw_count(), 0);
}

#[test]
fn compile_failure_propagates_diagnostics() {
    let err = ScenePipeline::new(RejectingCompiler, &mesh::generate(2, 2), 1.0)
        .err()
        .unwrap();
    match err {
        ViewerError::ShaderCompile(msg) => assert!(msg.contains("syntax error")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn first_frame_draws_even_when_clean() {
    let mut s = scene(4, 2);
    let mut cam = camera();
    cam.clear_dirty();
    assert!(s.render(&mut cam).unwrap());
    assert_eq!(s.frames_drawn(), 1);
}

#[test]
fn draw_covers_every_strip_vertex() {
    let mut s = scene(8, 4);
    let mut cam = camera();
    s.render(&mut cam).unwrap();
    assert_eq!(s.backend().calls.last(), Some(&GpuCall::DrawTriangleStrip(64)));
    assert_eq!(s.vertex_count(), 64);
}

#[test]
fn clean_scene_is_not_redrawn() {
    let mut s = scene(4, 2);
    let mut cam = camera();
    assert!(s.render(&mut cam).unwrap());
    assert!(!cam.is_scene_dirty());
    assert!(!s.render(&mut cam).unwrap());
    assert_eq!(s.backend().draw_count(), 1);
}

#[test]
fn camera_change_triggers_redraw_with_new_matrix() {
    let mut s = scene(4, 2);
    let mut cam = camera();
    s.render(&mut cam).unwrap();
    let before = s.backend().last_matrix().unwrap();
    cam.set_ptz(0.5, 0.0, 0.0);
    assert!(s.render(&mut cam).unwrap());
    let after = s.backend().last_matrix().unwrap();
    assert_ne!(before, after);
    assert_eq!(after, projection::build(cam.ptz(), 640, 360, 1.0).unwrap());
}

#[test]
fn every_draw_uses_linear_filtering() {
    let mut s = scene(4, 2);
    let mut cam = camera();
    s.render(&mut cam).unwrap();
    assert!(s.backend().calls.contains(&GpuCall::SetFilterMode(TextureFilter::Linear)));
}

#[test]
fn empty_viewport_skips_and_stays_dirty() {
    let mut s = scene(4, 2);
    let mut cam = Camera::new(&ViewerConfig::default());
    cam.mark_dirty();
    assert!(!s.render(&mut cam).unwrap());
    assert!(cam.is_scene_dirty());
    assert_eq!(s.backend().draw_count(), 0);
}

#[test]
fn image_goes_to_scene_texture() {
    let mut s = scene(4, 2);
    s.upload_image(&RgbaImage::new(8, 4)).unwrap();
    assert_eq!(
        s.backend().calls.last(),
        Some(&GpuCall::UploadImage { width: 8, height: 4 })
    );
}
