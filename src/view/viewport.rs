use crate::foundation::core::{BoundingBox, Point, Vec2};

/// Pan/zoom view transform: `screen = scene * scale + pan`.
///
/// View state is never recorded in history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub scale: f64,
    /// Viewport size in screen pixels.
    pub width: f64,
    pub height: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
            width,
            height,
            min_scale: 0.05,
            max_scale: 32.0,
        }
    }

    pub fn with_scale_limits(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale.max(min_scale);
        self.scale = self.clamp_scale(self.scale);
        self
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn clamp_scale(&self, s: f64) -> f64 {
        s.clamp(self.min_scale, self.max_scale)
    }

    pub fn screen_to_scene(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) / self.scale, (p.y - self.pan.y) / self.scale)
    }

    pub fn scene_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.pan.x, p.y * self.scale + self.pan.y)
    }

    /// Scene-space length of a screen-space vector.
    pub fn screen_delta_to_scene(&self, v: Vec2) -> Vec2 {
        v / self.scale
    }

    /// Scene point at the middle of the viewport.
    pub fn center_in_scene(&self) -> Point {
        self.screen_to_scene(Point::new(self.width / 2.0, self.height / 2.0))
    }

    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta;
    }

    /// Multiply the scale by `factor`, keeping the scene point under `screen_anchor` fixed.
    pub fn zoom_at(&mut self, screen_anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let before = self.screen_to_scene(screen_anchor);
        self.scale = self.clamp_scale(self.scale * factor);
        self.pan = Vec2::new(
            screen_anchor.x - before.x * self.scale,
            screen_anchor.y - before.y * self.scale,
        );
    }

    /// Scale and center `bounds` inside the viewport with `padding` screen pixels per side.
    pub fn zoom_to_fit(&mut self, bounds: BoundingBox, padding: f64) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }
        let avail_w = (self.width - 2.0 * padding).max(1.0);
        let avail_h = (self.height - 2.0 * padding).max(1.0);
        self.scale = self.clamp_scale((avail_w / bounds.width).min(avail_h / bounds.height));
        let c = bounds.center();
        self.pan = Vec2::new(
            self.width / 2.0 - c.x * self.scale,
            self.height / 2.0 - c.y * self.scale,
        );
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Select,
    /// Pointer drags pan the view.
    Hand,
}

/// Persistent tool plus the momentary hand override held by the space bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolState {
    pub mode: ToolMode,
    pub space_held: bool,
}

impl ToolState {
    pub fn effective(&self) -> ToolMode {
        if self.space_held {
            ToolMode::Hand
        } else {
            self.mode
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/viewport.rs"]
mod tests;
