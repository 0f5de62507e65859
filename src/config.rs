// config.rs - 查看器配置 (JSON 文件 / 默认值)

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::ViewerError;
use crate::projection::ZOOM_BASE;
use serde::Deserialize;
use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

/// Viewer options. Every key is optional in JSON; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    /// Longitude steps per band.
    pub h_div: u32,
    /// Latitude bands.
    pub v_div: u32,
    pub tilt_min: f32,
    pub tilt_max: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Per-frame velocity multiplier once a gesture is released.
    pub attenuation: f32,
    /// Strength of the perspective-shear term; also feeds pointer sensitivity.
    pub perspective_rate: f32,
    /// Upper bound for the texture edge, 0 = GPU limit only.
    pub max_texture_size: u32,
    /// Equirectangular image to show.
    pub source: Option<PathBuf>,
    /// Show the generated checkerboard when no source is given.
    pub debug_texture: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let h_div = 32;
        Self {
            width: 640,
            height: 360,
            h_div,
            v_div: h_div << 1,
            tilt_min: -FRAC_PI_2,
            tilt_max: FRAC_PI_2,
            zoom_min: -5.0,
            zoom_max: 5.0,
            attenuation: 0.98,
            perspective_rate: 1.0,
            max_texture_size: 0,
            source: None,
            debug_texture: false,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ViewerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects bounds the camera and projection cannot work with.
    pub fn validate(&self) -> Result<(), ViewerError> {
        let bounds = [
            ("tilt_min", self.tilt_min),
            ("tilt_max", self.tilt_max),
            ("zoom_min", self.zoom_min),
            ("zoom_max", self.zoom_max),
            ("attenuation", self.attenuation),
            ("perspective_rate", self.perspective_rate),
        ];
        for (name, value) in bounds {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {value}")));
            }
        }

        if self.tilt_min > self.tilt_max {
            return Err(invalid(format!(
                "tilt_min ({}) > tilt_max ({})",
                self.tilt_min, self.tilt_max
            )));
        }
        if self.zoom_min > self.zoom_max {
            return Err(invalid(format!(
                "zoom_min ({}) > zoom_max ({})",
                self.zoom_min, self.zoom_max
            )));
        }
        if !(self.attenuation > 0.0 && self.attenuation < 1.0) {
            return Err(invalid(format!(
                "attenuation must lie in (0, 1), got {}",
                self.attenuation
            )));
        }
        if self.h_div == 0 || self.v_div == 0 {
            return Err(invalid(format!(
                "mesh subdivisions must be non-zero, got {}x{}",
                self.h_div, self.v_div
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }

        // radius = width * 1.5^zoom 不能塌缩为 0 或溢出
        let lo = ZOOM_BASE.powf(self.zoom_min);
        let hi = ZOOM_BASE.powf(self.zoom_max);
        if lo * (self.width as f32) < f32::MIN_POSITIVE || !(hi * self.width as f32).is_finite() {
            return Err(invalid(format!(
                "zoom range [{}, {}] collapses or overflows the radius",
                self.zoom_min, self.zoom_max
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ViewerError {
    ViewerError::Configuration(msg)
}

/// Config path from CLI (`--config <path>`) or `SPHERICAL_VIEWER_CONFIG`.
pub fn resolve_config_path<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == "--config" {
            if let Some(v) = it.next() {
                return Some(PathBuf::from(v));
            }
        }
    }

    if let Ok(v) = std::env::var("SPHERICAL_VIEWER_CONFIG") {
        if !v.trim().is_empty() {
            return Some(PathBuf::from(v));
        }
    }

    None
}

/// First argument that is neither a flag nor a flag's value.
pub fn resolve_image_arg<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut it = args.into_iter().skip(1);
    while let Some(a) = it.next() {
        if a == "--config" {
            it.next();
            continue;
        }
        if !a.starts_with("--") {
            return Some(PathBuf::from(a));
        }
    }
    None
}
