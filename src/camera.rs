// camera.rs - 平移/俯仰/缩放 (PTZ) 相机与惯性运动
//
// 拖动时：用最近 8 帧的瞬时速率取平均来估计甩动速度。
// 松手后：按速度积分位置，每帧乘以衰减系数 att。
// 衰减按帧而不是按时间计算，帧率不同手感也不同，这是保留的行为。

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::config::ViewerConfig;
use crate::projection;

/// Samples kept per axis for velocity estimation.
pub const VELOCITY_WINDOW: usize = 8;

/// Combined speed below which all velocities snap to zero.
pub const REST_SPEED: f32 = 1e-6;

/// Zoom change per wheel pixel, before the radius/rate conversion.
pub const WHEEL_SCALE: f32 = 0.1;

/// Pan, tilt and zoom. Angles in radians, zoom on a log scale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ptz {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

/// Everything the camera owns. Read through [`Camera::state`]; mutate only via `Camera` methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraState {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
    /// Smoothed rates, units per second.
    pub velocity_pan: f32,
    pub velocity_tilt: f32,
    pub velocity_zoom: f32,
    pub dragging: bool,
    pub scene_dirty: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// `viewport_width * 1.5^zoom`, kept in step with zoom and width.
    pub radius: f32,
}

/// Fixed-size ring of recent rates; the estimate is their mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragingFilter {
    samples: [f32; VELOCITY_WINDOW],
    len: usize,
    next: usize,
}

impl AveragingFilter {
    /// Records a rate and returns the mean of the retained samples.
    pub fn push(&mut self, rate: f32) -> f32 {
        if self.len < VELOCITY_WINDOW {
            self.samples[self.len] = rate;
            self.len += 1;
        } else {
            self.samples[self.next] = rate;
            self.next = (self.next + 1) % VELOCITY_WINDOW;
        }
        self.mean()
    }

    pub fn mean(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        self.samples[..self.len].iter().sum::<f32>() / self.len as f32
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bounds and motion constants copied out of [`ViewerConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub tilt_min: f32,
    pub tilt_max: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub attenuation: f32,
    pub perspective_rate: f32,
}

impl From<&ViewerConfig> for CameraLimits {
    fn from(c: &ViewerConfig) -> Self {
        Self {
            tilt_min: c.tilt_min,
            tilt_max: c.tilt_max,
            zoom_min: c.zoom_min,
            zoom_max: c.zoom_max,
            attenuation: c.attenuation,
            perspective_rate: c.perspective_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    state: CameraState,
    limits: CameraLimits,
    filters: [AveragingFilter; 3],
    /// PTZ recorded at the end of the previous `advance`.
    last: Option<Ptz>,
}

impl Camera {
    /// All-zero PTZ, clean scene, empty viewport. `config` must already be validated.
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            state: CameraState::default(),
            limits: CameraLimits::from(config),
            filters: [AveragingFilter::default(); 3],
            last: None,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn limits(&self) -> &CameraLimits {
        &self.limits
    }

    pub fn ptz(&self) -> Ptz {
        Ptz {
            pan: self.state.pan,
            tilt: self.state.tilt,
            zoom: self.state.zoom,
        }
    }

    /// Stores clamped tilt/zoom and free pan. Marks the scene dirty only on change.
    pub fn set_ptz(&mut self, pan: f32, tilt: f32, zoom: f32) {
        if !(pan.is_finite() && tilt.is_finite() && zoom.is_finite()) {
            log::warn!("ignoring non-finite PTZ ({pan}, {tilt}, {zoom})");
            return;
        }

        let l = &self.limits;
        let tilt = tilt.clamp(l.tilt_min, l.tilt_max);
        let zoom = zoom.clamp(l.zoom_min, l.zoom_max);

        let s = &mut self.state;
        let moved = s.pan != pan || s.tilt != tilt || s.zoom != zoom;
        if moved {
            s.pan = pan;
            s.tilt = tilt;
            s.zoom = zoom;
            s.radius = projection::radius(zoom, s.viewport_width);
            s.scene_dirty = true;
        }
    }

    pub fn begin_drag(&mut self) {
        self.state.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.state.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    /// Pixel deltas to PTZ deltas: `delta / radius * (1 + perspective_rate)`.
    pub fn apply_pointer_delta(&mut self, dx_pan: f32, dx_tilt: f32, dx_zoom: Option<f32>) {
        let r = self.state.radius;
        if !(r > 0.0) {
            return;
        }
        let rate = self.rate();
        let cur = self.ptz();
        self.set_ptz(
            cur.pan + dx_pan / r * rate,
            cur.tilt + dx_tilt / r * rate,
            cur.zoom + dx_zoom.unwrap_or(0.0) / r * rate,
        );
    }

    /// Vertical wheel delta in pixels; zoom only.
    pub fn apply_wheel_delta(&mut self, delta_y: f32) {
        self.apply_pointer_delta(0.0, 0.0, Some(delta_y * WHEEL_SCALE));
    }

    /// Pointer sensitivity multiplier.
    pub fn rate(&self) -> f32 {
        1.0 + self.limits.perspective_rate
    }

    /// Per-frame motion step. `dt` in seconds.
    ///
    /// The first call only records the current PTZ. A non-positive `dt` is inert.
    pub fn advance(&mut self, dt: f32) {
        let Some(last) = self.last else {
            self.last = Some(self.ptz());
            return;
        };
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        let cur = self.ptz();
        let att = self.limits.attenuation;
        let s = &mut self.state;
        let [fp, ft, fz] = &mut self.filters;

        let next = if s.dragging {
            s.velocity_pan = fp.push((cur.pan - last.pan) / dt);
            s.velocity_tilt = ft.push((cur.tilt - last.tilt) / dt);
            s.velocity_zoom = fz.push((cur.zoom - last.zoom) / dt);
            None
        } else {
            let next = Ptz {
                pan: cur.pan + s.velocity_pan * dt,
                tilt: cur.tilt + s.velocity_tilt * dt,
                zoom: cur.zoom + s.velocity_zoom * dt,
            };
            s.velocity_pan *= att;
            s.velocity_tilt *= att;
            s.velocity_zoom *= att;
            Some(next)
        };

        if self.speed() < REST_SPEED {
            let s = &mut self.state;
            s.velocity_pan = 0.0;
            s.velocity_tilt = 0.0;
            s.velocity_zoom = 0.0;
        }

        if let Some(next) = next {
            self.set_ptz(next.pan, next.tilt, next.zoom);
        }

        self.last = Some(self.ptz());
    }

    /// Magnitude of the combined velocity.
    pub fn speed(&self) -> f32 {
        let s = &self.state;
        (s.velocity_pan * s.velocity_pan
            + s.velocity_tilt * s.velocity_tilt
            + s.velocity_zoom * s.velocity_zoom)
            .sqrt()
    }

    pub fn is_at_rest(&self) -> bool {
        self.speed() == 0.0
    }

    /// Returns true if the size changed (which also dirties the scene).
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        let s = &mut self.state;
        if s.viewport_width == width && s.viewport_height == height {
            return false;
        }
        s.viewport_width = width;
        s.viewport_height = height;
        s.radius = projection::radius(s.zoom, width);
        s.scene_dirty = true;
        true
    }

    pub fn is_scene_dirty(&self) -> bool {
        self.state.scene_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.state.scene_dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.state.scene_dirty = false;
    }

    /// Samples retained by the pan/tilt/zoom filters.
    pub fn filter_lens(&self) -> [usize; 3] {
        self.filters.each_ref().map(AveragingFilter::len)
    }
}
