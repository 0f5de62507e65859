// main.rs - 窗口宿主：winit 事件 -> 手势 / 帧时钟 -> Viewer

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

use spherical_viewer::config::{self, ViewerConfig};
use spherical_viewer::input::GestureTracker;
use spherical_viewer::texture;
use spherical_viewer::{Viewer, ViewerError, WgpuBackend};

use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use image::{DynamicImage, GenericImageView};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Pixels per wheel line.
const LINE_HEIGHT: f32 = 100.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let initial_image = config::resolve_image_arg(args.iter().cloned()).or_else(|| config.source.clone());

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title("Spherical Viewer")
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("failed to create window: {e}");
            std::process::exit(1);
        }
    };

    let backend = match pollster::block_on(WgpuBackend::new(&window)) {
        Ok(b) => b,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    let mut viewer = match Viewer::new(backend, config) {
        Ok(v) => v,
        Err(e) => {
            log::error!("failed to start viewer: {e}");
            std::process::exit(1);
        }
    };
    let mut gestures = GestureTracker::new();
    let mut zoom_modifier = false;
    let mut cursor = (0.0f32, 0.0f32);

    // 异步加载通道
    let (tx, rx): (Sender<DynamicImage>, Receiver<DynamicImage>) = channel();
    if let Some(path) = initial_image {
        start_load_image(path, tx.clone());
    }

    let start = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 检查是否有新加载的图片
        if let Ok(img) = rx.try_recv() {
            if let Err(e) = viewer.load_image(img) {
                log::error!("failed to upload image: {e}");
            }
        }

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }

                WindowEvent::KeyboardInput { input, .. } => {
                    if input.state == ElementState::Pressed {
                        match input.virtual_keycode {
                            Some(VirtualKeyCode::O) => {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
                                    .pick_file()
                                {
                                    start_load_image(path, tx.clone());
                                }
                            }
                            Some(VirtualKeyCode::F11) => {
                                if viewer.toggle_fullscreen() {
                                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                                } else {
                                    window.set_fullscreen(None);
                                }
                            }
                            _ => {}
                        }
                    }
                }

                WindowEvent::ModifiersChanged(state) => {
                    zoom_modifier = state.ctrl();
                }

                WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                    ElementState::Pressed => {
                        let (x, y) = cursor;
                        gestures.mouse_down(viewer.camera_mut(), x, y);
                    }
                    ElementState::Released => gestures.mouse_up(viewer.camera_mut()),
                },

                WindowEvent::CursorMoved { position, .. } => {
                    cursor = (position.x as f32, position.y as f32);
                    gestures.mouse_move(viewer.camera_mut(), cursor.0, cursor.1, zoom_modifier);
                }

                WindowEvent::MouseWheel { delta, .. } => {
                    let delta_y = match delta {
                        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                    };
                    gestures.wheel(viewer.camera_mut(), delta_y);
                }

                WindowEvent::Touch(Touch { phase, location, id, .. }) => {
                    let (x, y) = (location.x as f32, location.y as f32);
                    match phase {
                        TouchPhase::Started => gestures.touch_start(viewer.camera_mut(), id, x, y),
                        TouchPhase::Moved => gestures.touch_move(viewer.camera_mut(), id, x, y),
                        TouchPhase::Ended | TouchPhase::Cancelled => gestures.touch_end(viewer.camera_mut(), id),
                    }
                }

                WindowEvent::DroppedFile(path) => {
                    start_load_image(path, tx.clone());
                }

                _ => {}
            },

            Event::RedrawRequested(_) => {
                let size = window.inner_size();
                let now_ms = start.elapsed().as_secs_f64() * 1000.0;
                match viewer.frame(now_ms, size.width, size.height) {
                    Ok(_) => {}
                    Err(ViewerError::Surface(wgpu::SurfaceError::Lost)) => viewer.backend_mut().reconfigure(),
                    Err(ViewerError::Surface(wgpu::SurfaceError::OutOfMemory)) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn load_config(args: &[String]) -> Result<ViewerConfig, ViewerError> {
    let config = match config::resolve_config_path(args.iter().cloned()) {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            ViewerConfig::from_json_file(&path)?
        }
        None => ViewerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn start_load_image(path: PathBuf, tx: Sender<DynamicImage>) {
    thread::spawn(move || {
        log::info!("loading image in background: {}", path.display());
        match texture::load_image(&path) {
            Ok(img) => {
                let (w, h) = img.dimensions();
                log::info!("image loaded: {w}x{h}");
                if tx.send(img).is_err() {
                    log::error!("viewer closed before the image arrived");
                }
            }
            Err(e) => log::error!("failed to load {}: {e}", path.display()),
        }
    });
}
