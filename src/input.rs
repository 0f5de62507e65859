// input.rs - 鼠标/触摸手势 -> 相机增量
//
// 与窗口系统无关：宿主把坐标 (物理像素) 喂进来，这里负责拖动状态与增量换算。

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Camera;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchPoint {
    id: u64,
    x: f32,
    y: f32,
}

/// Tracks the active mouse or touch gesture between press and release.
#[derive(Debug, Default)]
pub struct GestureTracker {
    last_mouse: Option<(f32, f32)>,
    touches: Vec<TouchPoint>,
    last_touches: Option<Vec<TouchPoint>>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.last_mouse.is_some() || self.last_touches.is_some()
    }

    pub fn mouse_down(&mut self, camera: &mut Camera, x: f32, y: f32) {
        self.last_mouse = Some((x, y));
        camera.begin_drag();
    }

    /// Drag pans and tilts; with `zoom_modifier` held the vertical motion zooms instead.
    pub fn mouse_move(&mut self, camera: &mut Camera, x: f32, y: f32, zoom_modifier: bool) {
        let Some((lx, ly)) = self.last_mouse else {
            return;
        };
        let (dx, dy) = (x - lx, y - ly);
        if zoom_modifier {
            camera.apply_pointer_delta(0.0, 0.0, Some(dy));
        } else {
            camera.apply_pointer_delta(dx, dy, None);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn mouse_up(&mut self, camera: &mut Camera) {
        if self.last_mouse.take().is_some() {
            camera.end_drag();
        }
    }

    /// Vertical wheel motion in pixels, positive towards the user.
    pub fn wheel(&mut self, camera: &mut Camera, delta_y: f32) {
        camera.apply_wheel_delta(delta_y);
    }

    pub fn touch_start(&mut self, camera: &mut Camera, id: u64, x: f32, y: f32) {
        self.upsert(id, x, y);
        // 手势进行中新增的手指不重置参考点
        if self.last_touches.is_none() {
            self.last_touches = Some(self.touches.clone());
            camera.begin_drag();
        }
    }

    /// One finger pans and tilts; two fingers zoom by the change in their distance.
    pub fn touch_move(&mut self, camera: &mut Camera, id: u64, x: f32, y: f32) {
        let Some(last) = self.last_touches.take() else {
            return;
        };
        self.upsert(id, x, y);

        match (self.touches.as_slice(), last.as_slice()) {
            ([now], [before]) => {
                camera.apply_pointer_delta(now.x - before.x, now.y - before.y, None);
            }
            ([a, b], [la, lb]) => {
                let d = spread(a, b) - spread(la, lb);
                camera.apply_pointer_delta(0.0, 0.0, Some(d));
            }
            _ => {}
        }

        self.last_touches = Some(self.touches.clone());
    }

    pub fn touch_end(&mut self, camera: &mut Camera, id: u64) {
        self.touches.retain(|t| t.id != id);
        if self.touches.is_empty() && self.last_touches.take().is_some() {
            camera.end_drag();
        }
    }

    fn upsert(&mut self, id: u64, x: f32, y: f32) {
        match self.touches.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.x = x;
                t.y = y;
            }
            None => self.touches.push(TouchPoint { id, x, y }),
        }
    }
}

fn spread(a: &TouchPoint, b: &TouchPoint) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}
