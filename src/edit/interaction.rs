use std::collections::HashMap;

use crate::foundation::core::{BoundingBox, Point, Vec2};
use crate::geometry::{bounding_box_of, layer_contains_point, rotate_about, rotate_vec};
use crate::scene::layer::{Layer, LayerId, MIN_LAYER_SIZE};
use crate::scene::selection::Selection;

/// Rotation snapping increment while the constrain modifier is held.
pub const ROTATION_SNAP_DEG: f64 = 15.0;

/// Smallest uniform factor a group resize may reach.
const MIN_GROUP_SCALE: f64 = 0.01;

/// Resize handle on a layer frame or group box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    /// Unit direction from the box center: each component is -1, 0 or 1.
    pub fn direction(self) -> (f64, f64) {
        match self {
            Handle::TopLeft => (-1.0, -1.0),
            Handle::Top => (0.0, -1.0),
            Handle::TopRight => (1.0, -1.0),
            Handle::Right => (1.0, 0.0),
            Handle::BottomRight => (1.0, 1.0),
            Handle::Bottom => (0.0, 1.0),
            Handle::BottomLeft => (-1.0, 1.0),
            Handle::Left => (-1.0, 0.0),
        }
    }

    pub fn is_corner(self) -> bool {
        let (hx, hy) = self.direction();
        hx != 0.0 && hy != 0.0
    }
}

/// Keyboard modifiers sampled with each pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Constrain: axis-lock moves, keep aspect on resize, snap rotation, additive selection.
    pub shift: bool,
    /// Duplicate on drag.
    pub alt: bool,
    /// Ctrl on most platforms, Cmd on macOS.
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Handle(Handle),
    RotateHandle,
    Layer(LayerId),
    /// Inside a multi-selection's box but not on any layer.
    SelectionBox,
    Empty,
}

/// Kind of in-progress gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Move,
    Resize(Handle),
    Rotate,
    /// Alt-drag on a layer: clones were inserted at gesture start and are being moved.
    DuplicateMove,
    /// Alt-drag inside a multi-selection box: same as [`InteractionKind::DuplicateMove`] for the
    /// whole selection.
    CopySelectionMove,
    Marquee {
        additive: bool,
    },
}

/// An in-progress pointer gesture.
///
/// Every update is a pure function of the start snapshot and the total pointer displacement;
/// nothing is accumulated frame to frame.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub kind: InteractionKind,
    /// Gesture start in scene coordinates.
    pub start_pointer: Point,
    /// Latest pointer in scene coordinates.
    pub current_pointer: Point,
    /// Target layers as they were at gesture start.
    pub targets: Vec<Layer>,
    pub group_box: Option<BoundingBox>,
    pub group_center: Option<Point>,
}

impl Interaction {
    pub fn new(kind: InteractionKind, start_pointer: Point, targets: Vec<Layer>) -> Self {
        let group_box = bounding_box_of(&targets);
        Self {
            kind,
            start_pointer,
            current_pointer: start_pointer,
            targets,
            group_box,
            group_center: group_box.map(BoundingBox::center),
        }
    }

    pub fn target_ids(&self) -> Vec<LayerId> {
        self.targets.iter().map(|l| l.id.clone()).collect()
    }

    /// Live marquee rectangle, `None` for other gestures.
    pub fn marquee_rect(&self) -> Option<BoundingBox> {
        match self.kind {
            InteractionKind::Marquee { .. } => Some(BoundingBox::from_points(
                self.start_pointer,
                self.current_pointer,
            )),
            _ => None,
        }
    }

    /// Target geometry for pointer position `pointer`.
    pub fn transformed_targets(&self, pointer: Point, modifiers: Modifiers) -> Vec<Layer> {
        let delta = pointer - self.start_pointer;
        match self.kind {
            InteractionKind::Move
            | InteractionKind::DuplicateMove
            | InteractionKind::CopySelectionMove => {
                move_layers(&self.targets, constrain_delta(delta, modifiers.shift))
            }
            InteractionKind::Resize(handle) => match (self.targets.as_slice(), self.group_box) {
                ([single], _) => vec![resize_single(single, handle, delta, modifiers.shift)],
                (_, Some(group_box)) => resize_group(&self.targets, group_box, handle, delta),
                _ => self.targets.clone(),
            },
            InteractionKind::Rotate => {
                let center = match self.targets.as_slice() {
                    [single] => single.center(),
                    _ => self.group_center.unwrap_or(self.start_pointer),
                };
                rotate_layers(
                    &self.targets,
                    center,
                    self.start_pointer,
                    pointer,
                    modifiers.shift,
                )
            }
            InteractionKind::Marquee { .. } => Vec::new(),
        }
    }

    /// Record the pointer and return the full stack with updated targets spliced in.
    pub fn update(&mut self, layers: &[Layer], pointer: Point, modifiers: Modifiers) -> Vec<Layer> {
        self.current_pointer = pointer;
        let updated = self.transformed_targets(pointer, modifiers);
        splice_layers(layers, updated)
    }
}

/// Replace layers in `stack` by id with the ones in `updated`, keeping stack order.
pub fn splice_layers(stack: &[Layer], updated: Vec<Layer>) -> Vec<Layer> {
    if updated.is_empty() {
        return stack.to_vec();
    }
    let mut by_id: HashMap<LayerId, Layer> =
        updated.into_iter().map(|l| (l.id.clone(), l)).collect();
    stack
        .iter()
        .map(|l| by_id.remove(&l.id).unwrap_or_else(|| l.clone()))
        .collect()
}

fn constrain_delta(delta: Vec2, constrain: bool) -> Vec2 {
    if !constrain {
        return delta;
    }
    if delta.x.abs() >= delta.y.abs() {
        Vec2::new(delta.x, 0.0)
    } else {
        Vec2::new(0.0, delta.y)
    }
}

/// Translate every layer by the same scene-space delta.
pub fn move_layers(layers: &[Layer], delta: Vec2) -> Vec<Layer> {
    layers
        .iter()
        .cloned()
        .map(|mut l| {
            l.x += delta.x;
            l.y += delta.y;
            l
        })
        .collect()
}

/// Resize one layer by dragging `handle` by `delta` (scene space), anchored at the opposite
/// handle in the layer's rotated frame.
pub fn resize_single(layer: &Layer, handle: Handle, delta: Vec2, keep_aspect: bool) -> Layer {
    let (hx, hy) = handle.direction();
    let local = rotate_vec(delta, -layer.rotation);
    let (w0, h0) = (layer.width, layer.height);

    let mut w = (w0 + hx * local.x).max(MIN_LAYER_SIZE);
    let mut h = (h0 + hy * local.y).max(MIN_LAYER_SIZE);

    let text_corner = layer.is_text() && handle.is_corner();
    if keep_aspect || text_corner {
        let s = if hx == 0.0 {
            h / h0
        } else if hy == 0.0 {
            w / w0
        } else {
            let (sx, sy) = (w / w0, h / h0);
            if (sx - 1.0).abs() >= (sy - 1.0).abs() { sx } else { sy }
        };
        let s = s.max(MIN_LAYER_SIZE / w0.min(h0));
        w = w0 * s;
        h = h0 * s;
    }

    let c0 = layer.center();
    let anchor = c0 + rotate_vec(Vec2::new(-hx * w0 / 2.0, -hy * h0 / 2.0), layer.rotation);
    let c1 = anchor - rotate_vec(Vec2::new(-hx * w / 2.0, -hy * h / 2.0), layer.rotation);

    let mut out = layer.clone();
    if text_corner {
        let ratio = h / h0;
        if let Some(t) = out.text_mut() {
            t.font_size = (t.font_size * ratio).max(1.0);
        }
    }
    out.width = w;
    out.height = h;
    out.set_center(c1);
    out
}

/// Uniformly scale a group about the box point opposite `handle`.
///
/// Each layer's top-left is placed proportionally within the scaled group box, so relative
/// layout is preserved; rotations are unchanged.
pub fn resize_group(
    layers: &[Layer],
    group_box: BoundingBox,
    handle: Handle,
    delta: Vec2,
) -> Vec<Layer> {
    let (hx, hy) = handle.direction();
    let (bw, bh) = (group_box.width, group_box.height);
    let sx = if bw > 0.0 { (bw + hx * delta.x) / bw } else { 1.0 };
    let sy = if bh > 0.0 { (bh + hy * delta.y) / bh } else { 1.0 };
    let s = if hx == 0.0 {
        sy
    } else if hy == 0.0 {
        sx
    } else if (sx - 1.0).abs() >= (sy - 1.0).abs() {
        sx
    } else {
        sy
    };
    let s = s.max(MIN_GROUP_SCALE);

    let c = group_box.center();
    let anchor = Point::new(c.x - hx * bw / 2.0, c.y - hy * bh / 2.0);

    layers
        .iter()
        .cloned()
        .map(|mut l| {
            l.x = anchor.x + (l.x - anchor.x) * s;
            l.y = anchor.y + (l.y - anchor.y) * s;
            l.width *= s;
            l.height *= s;
            if let Some(t) = l.text_mut() {
                t.font_size *= s;
            }
            l
        })
        .collect()
}

/// Rotate layers by the pointer's angular travel around `center`.
///
/// A single layer spins in place; for groups each layer's center also orbits `center`.
pub fn rotate_layers(
    layers: &[Layer],
    center: Point,
    start: Point,
    pointer: Point,
    snap: bool,
) -> Vec<Layer> {
    let a0 = (start.y - center.y).atan2(start.x - center.x);
    let a1 = (pointer.y - center.y).atan2(pointer.x - center.x);
    let mut delta = (a1 - a0).to_degrees();
    if snap {
        delta = (delta / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG;
    }

    let group = layers.len() > 1;
    layers
        .iter()
        .cloned()
        .map(|mut l| {
            let mut r = l.rotation + delta;
            if snap && !group {
                r = (r / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG;
            }
            l.rotation = normalize_degrees(r);
            if group {
                let c = rotate_about(l.center(), center, delta);
                l.set_center(c);
            }
            l
        })
        .collect()
}

/// Map any angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r >= 360.0 { 0.0 } else { r }
}

/// Handle anchor points for the current selection, plus the rotate handle position.
///
/// A single selected layer exposes handles on its rotated frame; a group exposes them on the
/// axis-aligned group box. A lone locked layer exposes none.
pub fn selection_handles(
    layers: &[Layer],
    selection: &Selection,
    rotate_offset: f64,
) -> Option<(Vec<(Handle, Point)>, Point)> {
    let selected = selection.layers_in(layers);
    match selected.as_slice() {
        [] => None,
        [single] => {
            if single.is_locked {
                return None;
            }
            let c = single.center();
            let at = |hx: f64, hy: f64| {
                c + rotate_vec(
                    Vec2::new(hx * single.width / 2.0, hy * single.height / 2.0),
                    single.rotation,
                )
            };
            let handles = Handle::ALL
                .iter()
                .map(|&h| {
                    let (hx, hy) = h.direction();
                    (h, at(hx, hy))
                })
                .collect();
            let rot = c + rotate_vec(
                Vec2::new(0.0, -single.height / 2.0 - rotate_offset),
                single.rotation,
            );
            Some((handles, rot))
        }
        many => {
            let b = bounding_box_of(many.iter().copied())?;
            let c = b.center();
            let handles = Handle::ALL
                .iter()
                .map(|&h| {
                    let (hx, hy) = h.direction();
                    (h, Point::new(c.x + hx * b.width / 2.0, c.y + hy * b.height / 2.0))
                })
                .collect();
            Some((handles, Point::new(c.x, b.top() - rotate_offset)))
        }
    }
}

/// Classify a scene-space point: handles of the current selection first, then the topmost
/// visible layer under the point, then the multi-selection box.
pub fn hit_test(
    layers: &[Layer],
    selection: &Selection,
    p: Point,
    handle_radius: f64,
    rotate_offset: f64,
) -> HitTarget {
    if let Some((handles, rot)) = selection_handles(layers, selection, rotate_offset) {
        if (p - rot).hypot() <= handle_radius {
            return HitTarget::RotateHandle;
        }
        for (h, at) in handles {
            if (p - at).hypot() <= handle_radius {
                return HitTarget::Handle(h);
            }
        }
    }

    if let Some(hit) = layers
        .iter()
        .find(|l| l.is_visible && layer_contains_point(l, p))
    {
        return HitTarget::Layer(hit.id.clone());
    }

    if selection.len() > 1 {
        let selected = selection.layers_in(layers);
        if let Some(b) = bounding_box_of(selected.iter().copied()) {
            if b.contains(p) {
                return HitTarget::SelectionBox;
            }
        }
    }

    HitTarget::Empty
}

/// Ids of layers whose bounding box intersects `rect`, in stack order.
pub fn layers_in_rect(layers: &[Layer], rect: BoundingBox) -> Vec<LayerId> {
    layers
        .iter()
        .filter(|l| crate::geometry::layer_bounds(l).intersects(rect))
        .map(|l| l.id.clone())
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/edit/interaction.rs"]
mod tests;
