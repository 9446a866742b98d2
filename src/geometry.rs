//! Rotated-rectangle geometry shared by every multi-layer operation.

use crate::foundation::core::{BoundingBox, Point, Vec2};
use crate::scene::layer::Layer;

/// Rotate `p` about `pivot` by `degrees` (positive is clockwise in y-down scene space).
pub fn rotate_about(p: Point, pivot: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - pivot.x;
    let dy = p.y - pivot.y;
    Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
}

/// Rotate a vector by `degrees`.
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// The four corners of a layer after rotation about its own center, clockwise from top-left.
pub fn rotated_corners(layer: &Layer) -> [Point; 4] {
    let c = layer.center();
    let (x0, y0) = (layer.x, layer.y);
    let (x1, y1) = (layer.x + layer.width, layer.y + layer.height);
    [
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ]
    .map(|p| rotate_about(p, c, layer.rotation))
}

/// Axis-aligned box of a single (possibly rotated) layer.
pub fn layer_bounds(layer: &Layer) -> BoundingBox {
    bounding_box_of(std::slice::from_ref(layer)).unwrap_or_else(|| layer.frame())
}

/// Smallest axis-aligned box covering every rotated corner of every layer, `None` when empty.
pub fn bounding_box_of<'a, I>(layers: I) -> Option<BoundingBox>
where
    I: IntoIterator<Item = &'a Layer>,
{
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut any = false;

    for layer in layers {
        any = true;
        for p in rotated_corners(layer) {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
    }

    any.then(|| BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Exact point-in-rotated-rectangle test.
pub fn layer_contains_point(layer: &Layer, p: Point) -> bool {
    let local = rotate_about(p, layer.center(), -layer.rotation);
    layer.frame().contains(local)
}

#[cfg(test)]
#[path = "../tests/unit/geometry/bounds.rs"]
mod tests;
