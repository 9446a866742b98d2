//! Headless layer composer.
//!
//! A scene is a topmost-first stack of image and text layers on a canvas. The [`Composer`]
//! owns that scene together with a linear undo history, the selection, a pan/zoom viewport
//! and the pointer gesture in progress:
//!
//! - Load or build a [`Document`]
//! - Drive it with pointer events and [`Command`]s
//! - Rasterize layers, merge or bake them, and flatten the scene to PNG
//!
//! External services (image loading, AI generation, gallery, downloads) are injected through
//! a [`ComposerContext`].
#![forbid(unsafe_code)]

mod foundation;

/// Image sources, decoding and `data:` URIs.
pub mod assets;
/// Editor state machine and its commands.
pub mod composer;
/// Undo history, pointer gestures and selection-wide operations.
pub mod edit;
/// PNG metadata chunk.
pub mod encode;
/// Generation jobs, gallery and downloads.
pub mod generate;
/// Rotated-rectangle bounds and hit geometry.
pub mod geometry;
/// CPU rasterization and compositing.
pub mod render;
/// Persisted scene model.
pub mod scene;
/// Viewport, tool mode and keyboard shortcuts.
pub mod view;

pub use crate::foundation::core::{Affine, BoundingBox, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ComposerError, ComposerResult};

pub use crate::assets::{DecodedImage, ImageLoader, SourceLoader};
pub use crate::composer::{
    Command, Composer, ComposerContext, ComposerOpts, DropOutcome, PendingGeneration,
};
pub use crate::encode::{embed_metadata, extract_metadata};
pub use crate::generate::{
    CancelToken, DirDownloader, Downloader, Gallery, GalleryItem, GeneratedImage, GenerationJob,
    GenerationRequest, ImageGenerator, InMemoryGallery, run_job,
};
pub use crate::render::{RasterImage, RasterOpts, Rasterizer};
pub use crate::scene::{BlendMode, CanvasSettings, Document, Layer, LayerContent, LayerId, TextContent};
