//! Logical screen bounds and the 2D projections derived from them.
//!
//! Screen space has its origin at the top-left corner with Y pointing down.
//! 2D world space has Y pointing up; the screen centre maps to the camera
//! offset.

use glam::{Mat4, Vec2, Vec4};

use crate::settings::ProjectSettings;

/// Current logical screen bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBounds {
    pub width: f32,
    pub height: f32,
    pub aspect: f32,
    pub center: Vec2,
    /// `(left, top, right, bottom)` in screen pixels.
    pub bounds: Vec4,
}

impl ScreenBounds {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        Self {
            width,
            height,
            aspect: width / height,
            center: Vec2::new(width * 0.5, height * 0.5),
            bounds: Vec4::new(0.0, 0.0, width, height),
        }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Owns the screen bounds used by the 2D passes and the default 3D aspect.
#[derive(Debug, Clone, Default)]
pub struct ViewportManager {
    bounds: ScreenBounds,
    window_size: Vec2,
}

impl ViewportManager {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: ScreenBounds::new(width, height),
            window_size: Vec2::new(width, height),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> &ScreenBounds {
        &self.bounds
    }

    /// Size of the OS window, which may differ from the render resolution.
    #[must_use]
    pub fn window_size(&self) -> Vec2 {
        self.window_size
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.bounds = ScreenBounds::new(width, height);
    }

    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window_size = Vec2::new(width, height);
    }

    /// Takes the render resolution (debug override first) and the window
    /// size from the project.
    pub fn update_from_project(&mut self, project: &ProjectSettings) {
        let (rw, rh) = project.effective_render_resolution();
        let (ww, wh) = project.effective_window_size();
        self.bounds = ScreenBounds::new(rw as f32, rh as f32);
        self.window_size = Vec2::new(ww as f32, wh as f32);
        log::debug!("viewport: render {rw}x{rh}, window {ww}x{wh}");
    }

    /// `ortho(0, w, h, 0, -1, 1)`.
    #[must_use]
    pub fn screen_projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(0.0, self.bounds.width, self.bounds.height, 0.0, -1.0, 1.0)
    }

    /// World-space 2D projection centred on `center`; `zoom` is clamped to a
    /// small positive minimum.
    #[must_use]
    pub fn world_projection(&self, zoom: f32, center: Vec2) -> Mat4 {
        let zoom = zoom.max(0.01);
        let half = self.bounds.size() * 0.5 / zoom;
        Mat4::orthographic_rh_gl(
            center.x - half.x,
            center.x + half.x,
            center.y - half.y,
            center.y + half.y,
            -1000.0,
            1000.0,
        )
    }

    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2, zoom: f32, offset: Vec2) -> Vec2 {
        let zoom = zoom.max(0.01);
        let from_center = screen - self.bounds.center;
        Vec2::new(from_center.x, -from_center.y) / zoom + offset
    }

    #[must_use]
    pub fn world_to_screen(&self, world: Vec2, zoom: f32, offset: Vec2) -> Vec2 {
        let zoom = zoom.max(0.01);
        let scaled = (world - offset) * zoom;
        self.bounds.center + Vec2::new(scaled.x, -scaled.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_maps_to_offset() {
        let viewport = ViewportManager::new(800.0, 600.0);
        let offset = Vec2::new(100.0, 50.0);
        assert_eq!(viewport.world_to_screen(offset, 1.0, offset), Vec2::new(400.0, 300.0));
        assert_eq!(viewport.screen_to_world(Vec2::new(400.0, 300.0), 1.0, offset), offset);
    }

    #[test]
    fn screen_projection_is_top_left() {
        let viewport = ViewportManager::new(800.0, 600.0);
        let clip = viewport.screen_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x + 1.0).abs() < 1e-5);
        assert!((clip.y - 1.0).abs() < 1e-5);
    }
}
