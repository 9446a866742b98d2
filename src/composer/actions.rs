//! Composer operations that wait on rasterization or external collaborators.
//!
//! Each one leaves the scene untouched on error: a pending history interaction is rolled back
//! before the error propagates.

use std::sync::Arc;

use crate::assets::decode::{decode_data_uri, decode_image, encode_data_uri};
use crate::composer::state::Composer;
use crate::encode::png_meta::embed_metadata;
use crate::foundation::core::{BoundingBox, Point};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::generate::gallery::GalleryItem;
use crate::generate::job::{
    CancelToken, GeneratedImage, GenerationJob, GenerationRequest, ImageGenerator, run_job,
};
use crate::geometry::bounding_box_of;
use crate::scene::document::Document;
use crate::scene::layer::{Layer, LayerContent, LayerId, index_of};

/// What a dropped file turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// The bytes were a document; scene and history were replaced.
    Document,
    /// The bytes were an image, now this layer.
    Image(LayerId),
}

/// A generation ready to run against the configured generator.
///
/// Running it does not borrow the [`Composer`], so the composer can cancel it, or start a
/// newer generation that supersedes it, while its requests are in flight.
#[derive(Clone)]
pub struct PendingGeneration {
    pub job: GenerationJob,
    generator: Arc<dyn ImageGenerator>,
}

impl PendingGeneration {
    pub fn token(&self) -> &CancelToken {
        &self.job.token
    }

    /// Issue the job's requests; see [`run_job`].
    pub async fn run(&self) -> ComposerResult<Vec<GeneratedImage>> {
        run_job(self.generator.as_ref(), &self.job).await
    }
}

impl std::fmt::Debug for PendingGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingGeneration")
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Rasterize the selection into one image layer over its bounding box.
    ///
    /// Needs two or more selected layers. Returns the new layer's id.
    #[tracing::instrument(skip(self))]
    pub async fn merge_selection(&mut self) -> ComposerResult<Option<LayerId>> {
        let selected: Vec<Layer> = self.selected_layers().into_iter().cloned().collect();
        if selected.len() < 2 {
            return Ok(None);
        }
        let Some(bounds) = bounding_box_of(&selected) else {
            return Ok(None);
        };

        self.history.begin_interaction();
        let source = match self.capture_to_uri(&selected, bounds).await {
            Ok(uri) => uri,
            Err(e) => {
                self.history.rollback();
                return Err(e);
            }
        };

        let mut merged = Layer::new_image(source, bounds);
        merged.name = "Merged".to_string();
        let id = merged.id.clone();

        let stack = self.history.current();
        let insert_at = self.selection.indices_in(stack).first().copied().unwrap_or(0);
        let mut out = Vec::with_capacity(stack.len() + 1 - selected.len());
        for (i, l) in stack.iter().enumerate() {
            if i == insert_at {
                out.push(merged.clone());
            }
            if !self.selection.contains(&l.id) {
                out.push(l.clone());
            }
        }
        self.history.commit(out, true);
        self.selection.set([id.clone()]);
        self.prune_image_cache();
        tracing::info!(merged = selected.len(), id = %id, "merged selection");
        Ok(Some(id))
    }

    async fn capture_to_uri(
        &mut self,
        layers: &[Layer],
        bounds: BoundingBox,
    ) -> ComposerResult<String> {
        let img = self.rasterizer.capture_scene(layers, bounds, None).await?;
        img.to_data_uri()
    }

    /// Flatten the one selected layer into a plain image layer in the same stack slot.
    ///
    /// Geometry, rotation, blend mode, name and flags carry over; opacity moves into the pixels.
    #[tracing::instrument(skip(self))]
    pub async fn bake_selection(&mut self) -> ComposerResult<Option<LayerId>> {
        let selected = self.selected_layers();
        let [layer] = selected.as_slice() else {
            return Ok(None);
        };
        let layer = (*layer).clone();

        self.history.begin_interaction();
        let captured = match self.rasterizer.capture_layer(&layer).await {
            Ok(img) => img.to_data_uri(),
            Err(e) => Err(e),
        };
        let source = match captured {
            Ok(uri) => uri,
            Err(e) => {
                self.history.rollback();
                return Err(e);
            }
        };

        let mut baked = Layer {
            id: LayerId::fresh(),
            content: LayerContent::Image { source },
            opacity: 100.0,
            ..layer.clone()
        };
        if baked.name.is_empty() {
            baked.name = "Baked".to_string();
        }
        let id = baked.id.clone();

        let mut out = self.history.current().to_vec();
        let Some(idx) = index_of(&out, &layer.id) else {
            self.history.rollback();
            return Ok(None);
        };
        out[idx] = baked;
        self.history.commit(out, true);
        self.selection.set([id.clone()]);
        self.prune_image_cache();
        Ok(Some(id))
    }

    /// Capture each selected layer, hand it to the downloader and add it to the gallery.
    ///
    /// Returns the file names handed to the downloader.
    #[tracing::instrument(skip(self))]
    pub async fn export_selection(&mut self) -> ComposerResult<Vec<String>> {
        let selected: Vec<Layer> = self.selected_layers().into_iter().cloned().collect();
        let mut names = Vec::with_capacity(selected.len());
        for layer in &selected {
            let png = self.rasterizer.capture_layer(layer).await?.encode_png()?;
            let file_name = export_file_name(layer);
            if let Some(dl) = &self.ctx.downloader {
                dl.download(&file_name, &png).await?;
            }
            self.ctx
                .gallery
                .add(GalleryItem::new(encode_data_uri("image/png", &png), None))
                .await?;
            names.push(file_name);
        }
        tracing::info!(count = names.len(), "exported selection");
        Ok(names)
    }

    /// Add encoded image bytes as a layer centered at `at` (default: canvas or view center).
    ///
    /// The layer takes the image's pixel size, scaled down to fit inside a finite canvas.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn add_image_bytes(
        &mut self,
        bytes: Vec<u8>,
        at: Option<Point>,
    ) -> ComposerResult<LayerId> {
        let layer = self.image_layer_from_bytes(&bytes, at).await?;
        self.insert_layer(layer)
    }

    async fn image_layer_from_bytes(
        &mut self,
        bytes: &[u8],
        at: Option<Point>,
    ) -> ComposerResult<Layer> {
        let owned = bytes.to_vec();
        let decoded = tokio::task::spawn_blocking(move || decode_image(&owned))
            .await
            .map_err(|e| ComposerError::raster(format!("image decode task failed: {e}")))??;
        let mime = image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/png");

        let (w, h) = fit_size(
            f64::from(decoded.width),
            f64::from(decoded.height),
            self.canvas.bounds(),
        );
        let mut layer = Layer::new_image(
            encode_data_uri(mime, bytes),
            BoundingBox::new(0.0, 0.0, w, h),
        );
        layer.set_center(at.unwrap_or_else(|| self.default_drop_point()));
        Ok(layer)
    }

    /// Re-insert a gallery item as a new image layer.
    pub async fn add_from_gallery(
        &mut self,
        item_id: &str,
        at: Option<Point>,
    ) -> ComposerResult<LayerId> {
        let item = self.ctx.gallery.get(item_id).await?.ok_or_else(|| {
            ComposerError::validation(format!("no gallery item with id '{item_id}'"))
        })?;
        let (_, bytes) = decode_data_uri(&item.data_uri)?;
        self.add_image_bytes(bytes, at).await
    }

    /// Accept a dropped or picked file: a JSON document replaces the scene, anything else is
    /// decoded as an image.
    pub async fn drop_bytes(
        &mut self,
        bytes: Vec<u8>,
        at: Option<Point>,
    ) -> ComposerResult<DropOutcome> {
        let looks_like_json = bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'{');
        if looks_like_json {
            let doc = Document::from_reader(bytes.as_slice())?;
            self.load_document(doc)?;
            return Ok(DropOutcome::Document);
        }
        self.add_image_bytes(bytes, at).await.map(DropOutcome::Image)
    }

    /// Render the whole scene to PNG over `region`, or the canvas when `region` is `None`.
    ///
    /// An infinite canvas has no bounds of its own and requires a region. `metadata`, when
    /// given, is embedded into the PNG.
    #[tracing::instrument(skip(self, metadata))]
    pub async fn flatten(
        &mut self,
        region: Option<BoundingBox>,
        metadata: Option<&serde_json::Value>,
    ) -> ComposerResult<Vec<u8>> {
        let bounds = region.or_else(|| self.canvas.bounds()).ok_or_else(|| {
            ComposerError::validation("an infinite canvas needs an explicit capture region")
        })?;
        let background = self.canvas.background_rgba()?;
        let layers = self.history.current().to_vec();
        let img = self
            .rasterizer
            .capture_scene(&layers, bounds, background)
            .await?;
        let png = img.encode_png()?;
        match metadata {
            Some(meta) => embed_metadata(&png, meta),
            None => Ok(png),
        }
    }

    // Generation.

    /// Prepare a generation from the selection, cancelling any generation still in flight.
    ///
    /// With `batch`, each selected layer becomes its own request; otherwise all captures go
    /// into one request. With nothing selected the whole canvas is captured.
    #[tracing::instrument(skip(self, instruction))]
    pub async fn start_generation(
        &mut self,
        instruction: &str,
        batch: bool,
    ) -> ComposerResult<GenerationJob> {
        if let Some(prev) = self.active_generation.take() {
            tracing::debug!("cancelling previous generation");
            prev.cancel();
        }

        let selected: Vec<Layer> = self.selected_layers().into_iter().cloned().collect();
        let anchor = bounding_box_of(&selected);
        let mut captures = Vec::new();
        if selected.is_empty() {
            let bounds = self.canvas.bounds().ok_or_else(|| {
                ComposerError::validation("select layers to generate from on an infinite canvas")
            })?;
            let background = self.canvas.background_rgba()?;
            let layers = self.history.current().to_vec();
            captures.push(
                self.rasterizer
                    .capture_scene(&layers, bounds, background)
                    .await?,
            );
        } else {
            for layer in &selected {
                captures.push(self.rasterizer.capture_layer(layer).await?);
            }
        }

        let requests = if batch {
            captures
                .into_iter()
                .map(|img| GenerationRequest {
                    instruction: instruction.to_string(),
                    images: vec![img],
                })
                .collect()
        } else {
            vec![GenerationRequest {
                instruction: instruction.to_string(),
                images: captures,
            }]
        };

        let token = CancelToken::new();
        self.active_generation = Some(token.clone());
        Ok(GenerationJob {
            token,
            requests,
            anchor,
        })
    }

    /// Cancel the generation started last, if any.
    pub fn cancel_generation(&mut self) {
        if let Some(token) = self.active_generation.take() {
            token.cancel();
        }
    }

    /// Add the results of `job` as new layers at the top of the stack, all in one entry.
    ///
    /// A cancelled job adds nothing and yields [`ComposerError::Cancelled`].
    #[tracing::instrument(skip(self, job, results), fields(results = results.len()))]
    pub async fn apply_generation(
        &mut self,
        job: &GenerationJob,
        results: Vec<GeneratedImage>,
    ) -> ComposerResult<Vec<LayerId>> {
        if job.is_cancelled() {
            tracing::warn!(discarded = results.len(), "generation cancelled; results dropped");
            return Err(ComposerError::Cancelled);
        }
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let at = job
            .anchor
            .map(BoundingBox::center)
            .unwrap_or_else(|| self.default_drop_point());
        let mut new_layers = Vec::with_capacity(results.len());
        for res in &results {
            let mut layer = self.image_layer_from_bytes(&res.bytes, Some(at)).await?;
            layer.name = "Generated".to_string();
            new_layers.push(layer);
        }
        // Decoding awaited; a cancel may have landed meanwhile.
        if job.is_cancelled() {
            tracing::warn!(discarded = results.len(), "generation cancelled; results dropped");
            return Err(ComposerError::Cancelled);
        }

        for res in results {
            let png = match &res.metadata {
                Some(meta) => match embed_metadata(&res.bytes, meta) {
                    Ok(png) => png,
                    Err(e) => {
                        tracing::warn!(error = %e, "metadata not embedded; keeping image as is");
                        res.bytes
                    }
                },
                None => res.bytes,
            };
            let mime = image::guess_format(&png)
                .map(|f| f.to_mime_type())
                .unwrap_or("image/png");
            self.ctx
                .gallery
                .add(GalleryItem::new(encode_data_uri(mime, &png), res.metadata))
                .await?;
        }

        if self
            .active_generation
            .as_ref()
            .is_some_and(|t| t.same_as(&job.token))
        {
            self.active_generation = None;
        }
        self.insert_layers(new_layers)
    }

    /// Prepare a generation for the configured generator. Run it with
    /// [`PendingGeneration::run`], then hand the results to [`Composer::apply_generation`].
    pub async fn prepare_generation(
        &mut self,
        instruction: &str,
        batch: bool,
    ) -> ComposerResult<PendingGeneration> {
        let generator = self
            .ctx
            .generator
            .clone()
            .ok_or_else(|| ComposerError::generation("no image generator configured"))?;
        let job = self.start_generation(instruction, batch).await?;
        Ok(PendingGeneration { job, generator })
    }
}

/// Largest size with the aspect of `w` x `h` that fits inside `canvas`, never upscaled.
fn fit_size(w: f64, h: f64, canvas: Option<BoundingBox>) -> (f64, f64) {
    let s = match canvas {
        Some(c) => (c.width / w).min(c.height / h).min(1.0),
        None => 1.0,
    };
    (w * s, h * s)
}

fn export_file_name(layer: &Layer) -> String {
    let stem: String = layer
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    let short: String = layer.id.as_str().chars().take(8).collect();
    if stem.is_empty() {
        format!("layer-{short}.png")
    } else {
        format!("{stem}-{short}.png")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composer/actions.rs"]
mod tests;
