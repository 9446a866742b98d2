use std::sync::Arc;

use crate::assets::loader::{ImageLoader, SourceLoader};
use crate::generate::download::Downloader;
use crate::generate::gallery::{Gallery, InMemoryGallery};
use crate::generate::job::ImageGenerator;
use crate::render::raster::RasterOpts;
use crate::scene::layer::TextContent;

/// Injected collaborators. Nothing in the composer reaches for process-wide state.
#[derive(Clone)]
pub struct ComposerContext {
    pub loader: Arc<dyn ImageLoader>,
    pub generator: Option<Arc<dyn ImageGenerator>>,
    pub gallery: Arc<dyn Gallery>,
    pub downloader: Option<Arc<dyn Downloader>>,
}

impl ComposerContext {
    /// `data:` URI loading, in-memory gallery, no generator, no downloader.
    pub fn headless() -> Self {
        Self {
            loader: Arc::new(SourceLoader::data_uris_only()),
            generator: None,
            gallery: Arc::new(InMemoryGallery::new()),
            downloader: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_gallery(mut self, gallery: Arc<dyn Gallery>) -> Self {
        self.gallery = gallery;
        self
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }
}

impl Default for ComposerContext {
    fn default() -> Self {
        Self::headless()
    }
}

impl std::fmt::Debug for ComposerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposerContext")
            .field("generator", &self.generator.is_some())
            .field("downloader", &self.downloader.is_some())
            .finish_non_exhaustive()
    }
}

/// Tunables for editing, view and rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposerOpts {
    /// Retained history snapshots; `None` is unbounded.
    pub history_limit: Option<usize>,
    /// Offset of duplicated layers from their originals.
    pub duplicate_offset: f64,
    /// Gap between layers laid out by distribute-and-scale.
    pub distribute_gap: f64,
    pub nudge_step: f64,
    /// Nudge step with shift held.
    pub nudge_step_large: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Pointer tolerance around handles, in screen pixels.
    pub handle_radius_px: f64,
    /// Distance of the rotate handle above the selection, in screen pixels.
    pub rotate_handle_offset_px: f64,
    /// Margin kept around content by zoom-to-fit, in screen pixels.
    pub fit_padding_px: f64,
    pub raster: RasterOpts,
    /// Style of newly inserted text layers.
    pub default_text: TextContent,
}

impl Default for ComposerOpts {
    fn default() -> Self {
        Self {
            history_limit: Some(100),
            duplicate_offset: 20.0,
            distribute_gap: 20.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            min_zoom: 0.05,
            max_zoom: 32.0,
            handle_radius_px: 8.0,
            rotate_handle_offset_px: 24.0,
            fit_padding_px: 40.0,
            raster: RasterOpts::default(),
            default_text: TextContent::default(),
        }
    }
}
