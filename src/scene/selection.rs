use crate::scene::layer::{Layer, LayerId};

/// Ordered set of selected layer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<LayerId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.ids.contains(id)
    }

    /// Replace the selection, dropping duplicates while keeping first-seen order.
    pub fn set(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn add(&mut self, id: LayerId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &LayerId) {
        self.ids.retain(|x| x != id);
    }

    pub fn toggle(&mut self, id: LayerId) {
        if self.contains(&id) {
            self.remove(&id);
        } else {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist in `layers`.
    pub fn retain_existing(&mut self, layers: &[Layer]) {
        self.ids.retain(|id| layers.iter().any(|l| &l.id == id));
    }

    /// Selected layers in stack order (topmost first), ignoring stale ids.
    pub fn layers_in<'a>(&self, layers: &'a [Layer]) -> Vec<&'a Layer> {
        layers.iter().filter(|l| self.contains(&l.id)).collect()
    }

    /// Stack indices of the selected layers, ascending (topmost first).
    pub fn indices_in(&self, layers: &[Layer]) -> Vec<usize> {
        layers
            .iter()
            .enumerate()
            .filter(|(_, l)| self.contains(&l.id))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/selection.rs"]
mod tests;
