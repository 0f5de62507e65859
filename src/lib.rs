// lib.rs - 球面全景查看器核心
//
// 相机 (PTZ + 惯性) / 投影矩阵 / 球面网格 与一个可替换的 GPU 后端。

pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod headless;
pub mod input;
pub mod matrix;
pub mod mesh;
pub mod pipeline;
pub mod projection;
pub mod renderer;
pub mod texture;
pub mod viewer;

pub use camera::{Camera, CameraState, Ptz};
pub use config::ViewerConfig;
pub use error::ViewerError;
pub use gpu::GpuBackend;
pub use headless::HeadlessBackend;
pub use renderer::WgpuBackend;
pub use viewer::Viewer;
