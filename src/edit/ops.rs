//! Pure selection-wide edits over a topmost-first layer stack.
//!
//! Each function returns the new stack (or `None` when the selection is too small for the
//! operation to mean anything); committing to history is the caller's job.

use crate::foundation::core::BoundingBox;
use crate::geometry::{bounding_box_of, layer_bounds};
use crate::scene::layer::{Layer, LayerId};
use crate::scene::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

fn selected_box(layers: &[Layer], selection: &Selection) -> Option<BoundingBox> {
    bounding_box_of(selection.layers_in(layers))
}

fn map_selected(
    layers: &[Layer],
    selection: &Selection,
    mut f: impl FnMut(&mut Layer),
) -> Vec<Layer> {
    layers
        .iter()
        .cloned()
        .map(|mut l| {
            if selection.contains(&l.id) {
                f(&mut l);
            }
            l
        })
        .collect()
}

/// Snap each selected layer's edge or center to the selection box, on one axis only.
pub fn align(layers: &[Layer], selection: &Selection, alignment: Alignment) -> Option<Vec<Layer>> {
    if selection.layers_in(layers).len() < 2 {
        return None;
    }
    let group = selected_box(layers, selection)?;
    Some(map_selected(layers, selection, |l| {
        let own = layer_bounds(l);
        match alignment {
            Alignment::Left => l.x += group.left() - own.left(),
            Alignment::Center => l.x += group.center().x - own.center().x,
            Alignment::Right => l.x += group.right() - own.right(),
            Alignment::Top => l.y += group.top() - own.top(),
            Alignment::Middle => l.y += group.center().y - own.center().y,
            Alignment::Bottom => l.y += group.bottom() - own.bottom(),
        }
    }))
}

fn span(b: BoundingBox, axis: Axis) -> (f64, f64) {
    match axis {
        Axis::Horizontal => (b.x, b.width),
        Axis::Vertical => (b.y, b.height),
    }
}

/// Sorted `(stack index, bounds)` of the selected layers along `axis`.
fn sorted_along(layers: &[Layer], selection: &Selection, axis: Axis) -> Vec<(usize, BoundingBox)> {
    let mut items: Vec<(usize, BoundingBox)> = selection
        .indices_in(layers)
        .into_iter()
        .map(|i| (i, layer_bounds(&layers[i])))
        .collect();
    items.sort_by(|a, b| span(a.1, axis).0.total_cmp(&span(b.1, axis).0));
    items
}

/// Space the selection with equal gaps across its box; the outermost layers stay put.
pub fn distribute(layers: &[Layer], selection: &Selection, axis: Axis) -> Option<Vec<Layer>> {
    let items = sorted_along(layers, selection, axis);
    if items.len() < 2 {
        return None;
    }
    let group = selected_box(layers, selection)?;
    let (start, total) = span(group, axis);
    let sizes: f64 = items.iter().map(|(_, b)| span(*b, axis).1).sum();
    let gap = (total - sizes) / (items.len() - 1) as f64;

    let mut out = layers.to_vec();
    let mut cursor = start;
    for (i, b) in items {
        let (pos, size) = span(b, axis);
        let shift = cursor - pos;
        match axis {
            Axis::Horizontal => out[i].x += shift,
            Axis::Vertical => out[i].y += shift,
        }
        cursor += size + gap;
    }
    Some(out)
}

/// Rescale the selection to its average cross-axis size and lay it out edge to edge.
///
/// Horizontal: every layer gets the average height (aspect kept) and is placed left to right
/// from the box origin with `gap` between neighbours. Vertical is the transpose.
pub fn distribute_and_scale(
    layers: &[Layer],
    selection: &Selection,
    axis: Axis,
    gap: f64,
) -> Option<Vec<Layer>> {
    let items = sorted_along(layers, selection, axis);
    if items.len() < 2 {
        return None;
    }
    let group = selected_box(layers, selection)?;
    let n = items.len() as f64;
    let target = match axis {
        Axis::Horizontal => items.iter().map(|(i, _)| layers[*i].height).sum::<f64>() / n,
        Axis::Vertical => items.iter().map(|(i, _)| layers[*i].width).sum::<f64>() / n,
    };

    let mut out = layers.to_vec();
    let mut cursor = span(group, axis).0;
    for (i, _) in items {
        let l = &mut out[i];
        let s = match axis {
            Axis::Horizontal => target / l.height,
            Axis::Vertical => target / l.width,
        };
        l.scale_size(s);
        match axis {
            Axis::Horizontal => {
                l.height = target;
                l.x = cursor;
                l.y = group.y;
                cursor += l.width + gap;
            }
            Axis::Vertical => {
                l.width = target;
                l.y = cursor;
                l.x = group.x;
                cursor += l.height + gap;
            }
        }
    }
    Some(out)
}

/// Clone the selection offset by `(offset, offset)`, inserted above the topmost original.
///
/// Returns the new stack and the clone ids (stack order).
pub fn duplicate(
    layers: &[Layer],
    selection: &Selection,
    offset: f64,
) -> Option<(Vec<Layer>, Vec<LayerId>)> {
    let indices = selection.indices_in(layers);
    let insert_at = *indices.first()?;
    let clones: Vec<Layer> = indices
        .iter()
        .map(|&i| layers[i].duplicated(offset, offset))
        .collect();
    let ids = clones.iter().map(|l| l.id.clone()).collect();

    let mut out = layers.to_vec();
    out.splice(insert_at..insert_at, clones);
    Some((out, ids))
}

pub fn delete(layers: &[Layer], selection: &Selection) -> Option<Vec<Layer>> {
    if selection.layers_in(layers).is_empty() {
        return None;
    }
    Some(
        layers
            .iter()
            .filter(|l| !selection.contains(&l.id))
            .cloned()
            .collect(),
    )
}

/// Move each selected layer one step toward the top (index 0), unless blocked by another
/// selected layer.
pub fn raise(layers: &[Layer], selection: &Selection) -> Option<Vec<Layer>> {
    let mut out = layers.to_vec();
    let mut moved = false;
    for i in selection.indices_in(layers) {
        if i > 0 && !selection.contains(&out[i - 1].id) {
            out.swap(i - 1, i);
            moved = true;
        }
    }
    moved.then_some(out)
}

/// Move each selected layer one step toward the bottom.
pub fn lower(layers: &[Layer], selection: &Selection) -> Option<Vec<Layer>> {
    let mut out = layers.to_vec();
    let mut moved = false;
    for i in selection.indices_in(layers).into_iter().rev() {
        if i + 1 < out.len() && !selection.contains(&out[i + 1].id) {
            out.swap(i, i + 1);
            moved = true;
        }
    }
    moved.then_some(out)
}

/// Move the selection to the top of the stack, keeping its relative order.
pub fn bring_to_front(layers: &[Layer], selection: &Selection) -> Option<Vec<Layer>> {
    let (selected, rest): (Vec<Layer>, Vec<Layer>) =
        layers.iter().cloned().partition(|l| selection.contains(&l.id));
    if selected.is_empty() {
        return None;
    }
    Some(selected.into_iter().chain(rest).collect())
}

/// Move the selection to the bottom of the stack, keeping its relative order.
pub fn send_to_back(layers: &[Layer], selection: &Selection) -> Option<Vec<Layer>> {
    let (selected, rest): (Vec<Layer>, Vec<Layer>) =
        layers.iter().cloned().partition(|l| selection.contains(&l.id));
    if selected.is_empty() {
        return None;
    }
    Some(rest.into_iter().chain(selected).collect())
}

pub fn nudge(layers: &[Layer], selection: &Selection, dx: f64, dy: f64) -> Option<Vec<Layer>> {
    if selection.layers_in(layers).is_empty() {
        return None;
    }
    Some(map_selected(layers, selection, |l| {
        l.x += dx;
        l.y += dy;
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/edit/ops.rs"]
mod tests;
