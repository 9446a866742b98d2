use crate::composer::command::Command;
use crate::composer::context::{ComposerContext, ComposerOpts};
use crate::edit::history::History;
use crate::edit::interaction::{
    HitTarget, Interaction, InteractionKind, Modifiers, hit_test, layers_in_rect,
};
use crate::edit::ops;
use crate::foundation::color::parse_css_color;
use crate::foundation::core::{BoundingBox, Point};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::generate::job::CancelToken;
use crate::geometry::bounding_box_of;
use crate::render::raster::Rasterizer;
use crate::scene::document::{CanvasSettings, Document};
use crate::scene::layer::{BlendMode, Layer, LayerId, TextContent, index_of};
use crate::scene::selection::Selection;
use crate::view::keys::{KeyEvent, shortcut_for};
use crate::view::viewport::{ToolMode, ToolState, Viewport};

/// Headless layer composer: scene, history, selection, view and the active gesture.
///
/// Every scene change goes through [`History::commit`]. Pointer input arrives in screen
/// coordinates and is mapped through the [`Viewport`].
pub struct Composer {
    pub(super) canvas: CanvasSettings,
    pub(super) history: History,
    pub(super) selection: Selection,
    pub(super) viewport: Viewport,
    pub(super) tools: ToolState,
    pub(super) gesture: Option<Gesture>,
    pub(super) rasterizer: Rasterizer,
    pub(super) ctx: ComposerContext,
    pub(super) opts: ComposerOpts,
    pub(super) active_generation: Option<CancelToken>,
}

/// Pointer gesture in progress.
#[derive(Debug, Clone)]
pub(super) enum Gesture {
    Pan { last: Point },
    Edit {
        interaction: Interaction,
        /// Selection before the gesture, restored when a duplicate-drag goes nowhere.
        prior_selection: Vec<LayerId>,
    },
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("layers", &self.history.current().len())
            .field("history_index", &self.history.index())
            .field("selection", &self.selection)
            .field("viewport", &self.viewport)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Empty default canvas with a 1024x768 viewport.
    pub fn new(ctx: ComposerContext, opts: ComposerOpts) -> Self {
        let rasterizer = Rasterizer::new(ctx.loader.clone(), opts.raster);
        let viewport =
            Viewport::new(1024.0, 768.0).with_scale_limits(opts.min_zoom, opts.max_zoom);
        Self {
            canvas: CanvasSettings::default(),
            history: History::new(Vec::new(), opts.history_limit),
            selection: Selection::new(),
            viewport,
            tools: ToolState::default(),
            gesture: None,
            rasterizer,
            ctx,
            opts,
            active_generation: None,
        }
    }

    /// Composer opened on `doc`.
    pub fn with_document(
        doc: Document,
        ctx: ComposerContext,
        opts: ComposerOpts,
    ) -> ComposerResult<Self> {
        let mut c = Self::new(ctx, opts);
        c.load_document(doc)?;
        Ok(c)
    }

    pub fn layers(&self) -> &[Layer] {
        self.history.current()
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers().iter().find(|l| &l.id == id)
    }

    pub fn canvas(&self) -> &CanvasSettings {
        &self.canvas
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_layers(&self) -> Vec<&Layer> {
        self.selection.layers_in(self.history.current())
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn tools(&self) -> ToolState {
        self.tools
    }

    pub fn opts(&self) -> &ComposerOpts {
        &self.opts
    }

    pub fn context(&self) -> &ComposerContext {
        &self.ctx
    }

    pub fn rasterizer_mut(&mut self) -> &mut Rasterizer {
        &mut self.rasterizer
    }

    /// The live gesture, if a pointer is down on an edit.
    pub fn interaction(&self) -> Option<&Interaction> {
        match &self.gesture {
            Some(Gesture::Edit { interaction, .. }) => Some(interaction),
            _ => None,
        }
    }

    /// Replace scene and canvas with `doc`; history restarts at one entry.
    #[tracing::instrument(skip(self, doc), fields(layers = doc.layers.len()))]
    pub fn load_document(&mut self, doc: Document) -> ComposerResult<()> {
        doc.validate()?;
        self.gesture = None;
        self.canvas = doc.canvas_settings;
        self.history.reset(doc.layers);
        self.selection.clear();
        self.prune_image_cache();
        self.zoom_to_fit();
        Ok(())
    }

    /// Drop decoded images no longer drawn by the live stack. Undo may bring a layer back;
    /// its source is then decoded again on the next capture.
    pub(super) fn prune_image_cache(&mut self) {
        self.rasterizer
            .retain_images(self.history.current().iter().filter_map(Layer::image_source));
    }

    /// Snapshot of canvas settings plus the live layer stack.
    pub fn to_document(&self) -> Document {
        Document {
            canvas_settings: self.canvas.clone(),
            layers: self.history.current().to_vec(),
        }
    }

    pub fn set_canvas_settings(&mut self, canvas: CanvasSettings) -> ComposerResult<()> {
        Document {
            canvas_settings: canvas.clone(),
            layers: Vec::new(),
        }
        .validate()?;
        self.canvas = canvas;
        Ok(())
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.tools.space_held = held;
    }

    /// Commit `layers` as one history entry. Returns whether an entry was recorded.
    pub(super) fn apply(&mut self, layers: Vec<Layer>) -> bool {
        self.history.begin_interaction();
        self.history.commit(layers, true)
    }

    fn apply_op(&mut self, layers: Option<Vec<Layer>>) -> bool {
        match layers {
            Some(layers) => self.apply(layers),
            None => false,
        }
    }

    /// Dispatch a key press; returns the command it mapped to, if any.
    pub async fn handle_key(&mut self, event: &KeyEvent) -> ComposerResult<Option<Command>> {
        let Some(cmd) = shortcut_for(event, self.opts.nudge_step, self.opts.nudge_step_large)
        else {
            return Ok(None);
        };
        self.execute(cmd).await?;
        Ok(Some(cmd))
    }

    /// Run one command. Commands with too small a selection do nothing.
    pub async fn execute(&mut self, cmd: Command) -> ComposerResult<()> {
        tracing::debug!(?cmd, "execute");
        match cmd {
            Command::MergeSelection => {
                self.merge_selection().await?;
            }
            Command::BakeSelection => {
                self.bake_selection().await?;
            }
            Command::ExportSelection => {
                self.export_selection().await?;
            }
            other => self.execute_sync(other),
        }
        Ok(())
    }

    /// Commands that never wait on rasterization.
    pub fn execute_sync(&mut self, cmd: Command) {
        let layers = self.history.current();
        let sel = &self.selection;
        match cmd {
            Command::Undo => {
                if self.history.undo() {
                    self.selection.retain_existing(self.history.current());
                }
            }
            Command::Redo => {
                if self.history.redo() {
                    self.selection.retain_existing(self.history.current());
                }
            }
            Command::DeleteSelection => {
                let out = ops::delete(layers, sel);
                if self.apply_op(out) {
                    self.selection.clear();
                }
            }
            Command::DuplicateSelection => {
                if let Some((out, ids)) = ops::duplicate(layers, sel, self.opts.duplicate_offset) {
                    self.apply(out);
                    self.selection.set(ids);
                }
            }
            Command::RaiseSelection => {
                let out = ops::raise(layers, sel);
                self.apply_op(out);
            }
            Command::LowerSelection => {
                let out = ops::lower(layers, sel);
                self.apply_op(out);
            }
            Command::BringToFront => {
                let out = ops::bring_to_front(layers, sel);
                self.apply_op(out);
            }
            Command::SendToBack => {
                let out = ops::send_to_back(layers, sel);
                self.apply_op(out);
            }
            Command::SelectAll => {
                let ids: Vec<LayerId> = layers.iter().map(|l| l.id.clone()).collect();
                self.selection.set(ids);
            }
            Command::DeselectAll => self.selection.clear(),
            Command::SetTool(mode) => self.tools.mode = mode,
            Command::Nudge { dx, dy } => {
                let out = ops::nudge(layers, sel, dx, dy);
                self.apply_op(out);
            }
            Command::Align(a) => {
                let out = ops::align(layers, sel, a);
                self.apply_op(out);
            }
            Command::Distribute(axis) => {
                let out = ops::distribute(layers, sel, axis);
                self.apply_op(out);
            }
            Command::DistributeAndScale(axis) => {
                let out = ops::distribute_and_scale(layers, sel, axis, self.opts.distribute_gap);
                self.apply_op(out);
            }
            Command::ZoomToFit => self.zoom_to_fit(),
            Command::MergeSelection | Command::BakeSelection | Command::ExportSelection => {
                tracing::warn!(?cmd, "rasterizing command needs execute()");
            }
        }
        self.prune_image_cache();
    }

    /// Fit the canvas, or on an infinite canvas the layer bounds, into the viewport.
    pub fn zoom_to_fit(&mut self) {
        let target = self
            .canvas
            .bounds()
            .or_else(|| bounding_box_of(self.history.current()));
        if let Some(b) = target {
            self.viewport.zoom_to_fit(b, self.opts.fit_padding_px);
        }
    }

    /// Zoom by `factor` keeping the scene point under `screen_anchor` fixed.
    pub fn zoom_at(&mut self, screen_anchor: Point, factor: f64) {
        self.viewport.zoom_at(screen_anchor, factor);
    }

    /// Where new content lands when no point is given: canvas center, or the viewport center
    /// on an infinite canvas.
    pub(super) fn default_drop_point(&self) -> Point {
        match self.canvas.bounds() {
            Some(b) => b.center(),
            None => self.viewport.center_in_scene(),
        }
    }

    // Pointer gestures.

    /// Pointer pressed at `screen`.
    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        if self.gesture.is_some() {
            self.cancel_gesture();
        }
        if self.tools.effective() == ToolMode::Hand {
            self.gesture = Some(Gesture::Pan { last: screen });
            return;
        }

        let p = self.viewport.screen_to_scene(screen);
        let scale = self.viewport.scale;
        let hit = hit_test(
            self.history.current(),
            &self.selection,
            p,
            self.opts.handle_radius_px / scale,
            self.opts.rotate_handle_offset_px / scale,
        );
        tracing::trace!(?hit, x = p.x, y = p.y, "pointer down");
        let mut prior_selection = self.selection.ids().to_vec();

        let kind = match hit {
            HitTarget::Handle(h) => InteractionKind::Resize(h),
            HitTarget::RotateHandle => InteractionKind::Rotate,
            HitTarget::Layer(id) => {
                if modifiers.shift {
                    self.selection.toggle(id);
                    return;
                }
                let locked = self.layer(&id).is_some_and(|l| l.is_locked);
                if !self.selection.contains(&id) {
                    self.selection.set([id]);
                }
                if locked {
                    return;
                }
                if modifiers.alt {
                    prior_selection = self.insert_drag_clones();
                    InteractionKind::DuplicateMove
                } else {
                    InteractionKind::Move
                }
            }
            HitTarget::SelectionBox => {
                if modifiers.alt {
                    prior_selection = self.insert_drag_clones();
                    InteractionKind::CopySelectionMove
                } else {
                    InteractionKind::Move
                }
            }
            HitTarget::Empty => InteractionKind::Marquee {
                additive: modifiers.shift,
            },
        };

        let targets: Vec<Layer> = match kind {
            InteractionKind::Marquee { .. } => Vec::new(),
            _ => self.selected_layers().into_iter().cloned().collect(),
        };
        if !matches!(
            kind,
            InteractionKind::Marquee { .. }
                | InteractionKind::DuplicateMove
                | InteractionKind::CopySelectionMove
        ) {
            self.history.begin_interaction();
        }
        self.gesture = Some(Gesture::Edit {
            interaction: Interaction::new(kind, p, targets),
            prior_selection,
        });
    }

    /// Clone the selection in place above the originals and select the clones. The history
    /// interaction starts before the clones exist, so the whole duplicate-drag is one entry.
    ///
    /// Returns the ids of the originals.
    fn insert_drag_clones(&mut self) -> Vec<LayerId> {
        let originals = self.selection.ids().to_vec();
        self.history.begin_interaction();
        if let Some((out, ids)) = ops::duplicate(self.history.current(), &self.selection, 0.0) {
            self.history.commit(out, false);
            self.selection.set(ids);
        }
        originals
    }

    /// Pointer moved to `screen` (with or without a gesture in progress).
    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        match &mut self.gesture {
            None => {}
            Some(Gesture::Pan { last }) => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
            }
            Some(Gesture::Edit { interaction, .. }) => {
                let p = self.viewport.screen_to_scene(screen);
                if matches!(interaction.kind, InteractionKind::Marquee { .. }) {
                    interaction.current_pointer = p;
                    return;
                }
                let layers = interaction.update(self.history.current(), p, modifiers);
                self.history.commit(layers, false);
            }
        }
    }

    /// Pointer released at `screen`. Returns `true` when a history entry was recorded.
    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let (mut interaction, prior_selection) = match gesture {
            Gesture::Pan { last } => {
                self.viewport.pan_by(screen - last);
                return false;
            }
            Gesture::Edit {
                interaction,
                prior_selection,
            } => (interaction, prior_selection),
        };
        let p = self.viewport.screen_to_scene(screen);

        match interaction.kind {
            InteractionKind::Marquee { additive } => {
                interaction.current_pointer = p;
                self.finish_marquee(&interaction, additive);
                false
            }
            InteractionKind::DuplicateMove | InteractionKind::CopySelectionMove
                if p == interaction.start_pointer =>
            {
                self.history.rollback();
                self.selection.set(prior_selection);
                false
            }
            _ => {
                let layers = interaction.update(self.history.current(), p, modifiers);
                self.history.commit(layers, true)
            }
        }
    }

    fn finish_marquee(&mut self, interaction: &Interaction, additive: bool) {
        let Some(rect) = interaction.marquee_rect() else {
            return;
        };
        if interaction.current_pointer == interaction.start_pointer {
            if !additive {
                self.selection.clear();
            }
            return;
        }
        let visible: Vec<Layer> = self
            .history
            .current()
            .iter()
            .filter(|l| l.is_visible)
            .cloned()
            .collect();
        let hits = layers_in_rect(&visible, rect);
        tracing::debug!(hits = hits.len(), additive, "marquee");
        if additive {
            for id in hits {
                self.selection.add(id);
            }
        } else {
            self.selection.set(hits);
        }
    }

    /// Abandon the current gesture, restoring the last committed scene.
    pub fn cancel_gesture(&mut self) {
        if let Some(Gesture::Edit {
            prior_selection, ..
        }) = self.gesture.take()
        {
            self.history.rollback();
            self.selection.set(prior_selection);
            self.selection.retain_existing(self.history.current());
        }
    }

    // Per-layer property edits.

    /// Apply `f` to layer `id` as one history entry. Returns whether anything changed.
    pub fn update_layer(
        &mut self,
        id: &LayerId,
        f: impl FnOnce(&mut Layer),
    ) -> ComposerResult<bool> {
        let idx = index_of(self.history.current(), id)
            .ok_or_else(|| ComposerError::validation(format!("no layer with id '{id}'")))?;
        let mut layers = self.history.current().to_vec();
        let layer = &mut layers[idx];
        f(layer);
        layer.opacity = layer.opacity.clamp(0.0, 100.0);
        layer.id = id.clone();
        if !layer.is_renderable() {
            return Err(ComposerError::validation(
                "layer geometry must be finite with positive size",
            ));
        }
        if let Some(t) = layer.text() {
            if !(t.font_size.is_finite() && t.font_size > 0.0) {
                return Err(ComposerError::validation("font size must be > 0"));
            }
            parse_css_color(&t.color)?;
        }
        Ok(self.apply(layers))
    }

    pub fn rename_layer(&mut self, id: &LayerId, name: &str) -> ComposerResult<bool> {
        self.update_layer(id, |l| l.name = name.to_string())
    }

    pub fn toggle_visibility(&mut self, id: &LayerId) -> ComposerResult<bool> {
        self.update_layer(id, |l| l.is_visible = !l.is_visible)
    }

    pub fn toggle_lock(&mut self, id: &LayerId) -> ComposerResult<bool> {
        self.update_layer(id, |l| l.is_locked = !l.is_locked)
    }

    /// Opacity in percent; clamped to `0..=100`.
    pub fn set_opacity(&mut self, id: &LayerId, opacity: f64) -> ComposerResult<bool> {
        if !opacity.is_finite() {
            return Err(ComposerError::validation("opacity must be finite"));
        }
        self.update_layer(id, |l| l.opacity = opacity)
    }

    pub fn set_blend_mode(&mut self, id: &LayerId, mode: BlendMode) -> ComposerResult<bool> {
        self.update_layer(id, |l| l.blend_mode = mode)
    }

    pub fn set_geometry(
        &mut self,
        id: &LayerId,
        frame: BoundingBox,
        rotation: f64,
    ) -> ComposerResult<bool> {
        self.update_layer(id, |l| {
            l.x = frame.x;
            l.y = frame.y;
            l.width = frame.width;
            l.height = frame.height;
            l.rotation = rotation;
        })
    }

    /// Edit the text and style of a text layer.
    pub fn set_text(
        &mut self,
        id: &LayerId,
        f: impl FnOnce(&mut TextContent),
    ) -> ComposerResult<bool> {
        let is_text = self.layer(id).is_some_and(Layer::is_text);
        if !is_text {
            return Err(ComposerError::validation(format!(
                "layer '{id}' is not a text layer"
            )));
        }
        self.update_layer(id, |l| {
            if let Some(t) = l.text_mut() {
                f(t);
            }
        })
    }

    /// Insert `layer` at the top of the stack and select it.
    pub fn insert_layer(&mut self, layer: Layer) -> ComposerResult<LayerId> {
        self.insert_layers(vec![layer]).map(|mut ids| ids.remove(0))
    }

    /// Insert `new` (topmost first) above everything, select them, one history entry.
    pub(super) fn insert_layers(&mut self, new: Vec<Layer>) -> ComposerResult<Vec<LayerId>> {
        if new.is_empty() {
            return Err(ComposerError::validation("no layers to insert"));
        }
        if let Some(bad) = new.iter().find(|l| !l.is_renderable()) {
            return Err(ComposerError::validation(format!(
                "layer '{}' has non-finite geometry or non-positive size",
                bad.id
            )));
        }
        let ids: Vec<LayerId> = new.iter().map(|l| l.id.clone()).collect();
        let mut layers = new;
        layers.extend_from_slice(self.history.current());
        self.apply(layers);
        self.selection.set(ids.clone());
        Ok(ids)
    }

    /// Add a text layer centered at `at` (or the canvas center) with the default text style.
    pub fn add_text_layer(&mut self, text: &str, at: Option<Point>) -> ComposerResult<LayerId> {
        let style = TextContent {
            text: text.to_string(),
            ..self.opts.default_text.clone()
        };
        let size = style.font_size as f32;
        let measured = style
            .display_text()
            .split('\n')
            .map(|line| {
                self.rasterizer
                    .text_engine_mut()
                    .measure(line, &style, size)
            })
            .fold(0.0f32, f32::max);
        let longest = style
            .display_text()
            .split('\n')
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        // Without the family installed nothing shapes; fall back to an average glyph width.
        let width = if measured > 0.0 {
            f64::from(measured)
        } else {
            style.font_size * 0.6 * longest.max(1) as f64
        };
        let lines = text.split('\n').count().max(1) as f64;
        let height = style.font_size * style.line_height * lines;

        let mut layer = Layer::new_text(style, BoundingBox::new(0.0, 0.0, width.ceil(), height));
        layer.set_center(at.unwrap_or_else(|| self.default_drop_point()));
        self.insert_layer(layer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composer/state.rs"]
mod tests;
