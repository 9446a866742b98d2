use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assets::decode::{DecodedImage, decode_image, encode_data_uri, encode_png_premul};
use crate::assets::loader::ImageLoader;
use crate::foundation::color::parse_css_color;
use crate::foundation::core::{Affine, BoundingBox, Point, Rgba8};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::composite::blend_over_in_place;
use crate::render::text::{TextBrush, TextEngine, align_offset};
use crate::scene::layer::{Layer, LayerContent, TextContent};

/// Rasterization settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterOpts {
    /// Pixel density multiplier for standalone text captures.
    pub text_supersample: f64,
}

impl Default for RasterOpts {
    fn default() -> Self {
        Self {
            text_supersample: 2.0,
        }
    }
}

/// A flattened raster in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

impl RasterImage {
    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba8_premul.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn encode_png(&self) -> ComposerResult<Vec<u8>> {
        encode_png_premul(&self.rgba8_premul, self.width, self.height)
    }

    pub fn to_data_uri(&self) -> ComposerResult<String> {
        Ok(encode_data_uri("image/png", &self.encode_png()?))
    }
}

/// Produces pixels for layers: single-layer captures and flattened stacks.
///
/// Image sources are fetched through the injected [`ImageLoader`], decoded off the async
/// executor, and cached by source string for the lifetime of the rasterizer.
pub struct Rasterizer {
    loader: Arc<dyn ImageLoader>,
    text: TextEngine,
    opts: RasterOpts,
    images: HashMap<String, DecodedImage>,
    fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("opts", &self.opts)
            .field("cached_images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl Rasterizer {
    pub fn new(loader: Arc<dyn ImageLoader>, opts: RasterOpts) -> Self {
        Self {
            loader,
            text: TextEngine::new(),
            opts,
            images: HashMap::new(),
            fonts: HashMap::new(),
        }
    }

    pub fn opts(&self) -> RasterOpts {
        self.opts
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Number of decoded images currently cached.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    /// Evict every cached image whose source is not in `sources`.
    pub fn retain_images<'a, I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = sources.into_iter().collect();
        let before = self.images.len();
        self.images.retain(|source, _| keep.contains(source.as_str()));
        let evicted = before - self.images.len();
        if evicted > 0 {
            tracing::debug!(evicted, kept = self.images.len(), "image cache pruned");
        }
    }

    /// Decoded pixels of an image source, loading on first use.
    pub async fn image(&mut self, source: &str) -> ComposerResult<DecodedImage> {
        if let Some(img) = self.images.get(source) {
            return Ok(img.clone());
        }
        let bytes = self.loader.load(source).await?;
        let decoded = tokio::task::spawn_blocking(move || decode_image(&bytes))
            .await
            .map_err(|e| ComposerError::raster(format!("image decode task failed: {e}")))??;
        self.images.insert(source.to_string(), decoded.clone());
        Ok(decoded)
    }

    /// Load every image source referenced by `layers`.
    pub async fn preload<'a, I>(&mut self, layers: I) -> ComposerResult<()>
    where
        I: IntoIterator<Item = &'a Layer>,
    {
        for layer in layers {
            if let LayerContent::Image { source } = &layer.content {
                self.image(source).await?;
            }
        }
        Ok(())
    }

    /// Render one layer, unrotated, into its own tightly-cropped raster.
    ///
    /// Image layers come out at the source's native resolution; text layers at the layer box
    /// size times the text supersample factor. Opacity is baked into the pixels.
    #[tracing::instrument(skip(self, layer), fields(id = %layer.id))]
    pub async fn capture_layer(&mut self, layer: &Layer) -> ComposerResult<RasterImage> {
        let mut out = match &layer.content {
            LayerContent::Image { source } => {
                let img = self.image(source).await?;
                RasterImage {
                    width: img.width,
                    height: img.height,
                    rgba8_premul: img.rgba8_premul.as_ref().clone(),
                }
            }
            LayerContent::Text(style) => {
                let k = self.opts.text_supersample.max(1.0);
                let (w, h) = surface_size(layer.width * k, layer.height * k)?;
                let mut ctx = vello_cpu::RenderContext::new(w, h);
                draw_text(
                    &mut self.text,
                    &mut self.fonts,
                    &mut ctx,
                    style,
                    layer.width,
                    Affine::scale(k),
                )?;
                finish(ctx, w, h)
            }
        };
        apply_opacity(&mut out.rgba8_premul, layer.opacity_factor());
        tracing::debug!(width = out.width, height = out.height, "captured layer");
        Ok(out)
    }

    /// Flatten `layers` (topmost first) into one raster covering `bounds`.
    ///
    /// Layers paint back to front, each rotated about its own center, then composited with its
    /// opacity and blend mode. `background` fills the canvas first; `None` leaves it transparent.
    #[tracing::instrument(skip(self, layers), fields(count = layers.len()))]
    pub async fn capture_scene(
        &mut self,
        layers: &[Layer],
        bounds: BoundingBox,
        background: Option<Rgba8>,
    ) -> ComposerResult<RasterImage> {
        let (w, h) = surface_size(bounds.width, bounds.height)?;
        let visible: Vec<&Layer> = layers.iter().rev().filter(|l| l.is_visible).collect();
        self.preload(visible.iter().copied()).await?;

        let mut canvas = vec![0u8; usize::from(w) * usize::from(h) * 4];
        if let Some(bg) = background {
            let px = bg.to_premul_array();
            for dst in canvas.chunks_exact_mut(4) {
                dst.copy_from_slice(&px);
            }
        }

        for layer in visible {
            let local = Affine::translate((layer.x - bounds.x, layer.y - bounds.y))
                * Affine::rotate_about(
                    layer.rotation.to_radians(),
                    Point::new(layer.width / 2.0, layer.height / 2.0),
                );

            let mut ctx = vello_cpu::RenderContext::new(w, h);
            match &layer.content {
                LayerContent::Image { source } => {
                    let img = self
                        .images
                        .get(source)
                        .ok_or_else(|| ComposerError::raster("image was not preloaded"))?;
                    draw_image(&mut ctx, img, layer.width, layer.height, local)?;
                }
                LayerContent::Text(style) => {
                    draw_text(&mut self.text, &mut self.fonts, &mut ctx, style, layer.width, local)?;
                }
            }
            let scratch = finish(ctx, w, h);
            blend_over_in_place(
                &mut canvas,
                &scratch.rgba8_premul,
                layer.opacity_factor(),
                layer.blend_mode,
            )?;
        }

        Ok(RasterImage {
            width: u32::from(w),
            height: u32::from(h),
            rgba8_premul: canvas,
        })
    }
}

/// Pixel dimensions for a surface of logical size `w` x `h` (rounded up).
fn surface_size(w: f64, h: f64) -> ComposerResult<(u16, u16)> {
    let to_px = |v: f64, axis: &str| -> ComposerResult<u16> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ComposerError::raster(format!(
                "surface {axis} must be finite and > 0"
            )));
        }
        let px = v.ceil();
        if px > f64::from(u16::MAX) {
            return Err(ComposerError::raster(format!("surface {axis} exceeds u16")));
        }
        Ok(px as u16)
    };
    Ok((to_px(w, "width")?, to_px(h, "height")?))
}

fn finish(mut ctx: vello_cpu::RenderContext, w: u16, h: u16) -> RasterImage {
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    RasterImage {
        width: u32::from(w),
        height: u32::from(h),
        rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
    }
}

fn apply_opacity(rgba8_premul: &mut [u8], opacity: f32) {
    if opacity >= 1.0 {
        return;
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    for c in rgba8_premul.iter_mut() {
        *c = mul_div255_u8(u16::from(*c), op);
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &DecodedImage,
    width: f64,
    height: f64,
    transform: Affine,
) -> ComposerResult<()> {
    let pixmap = premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
    let (iw, ih) = (f64::from(img.width), f64::from(img.height));

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(
        transform * Affine::scale_non_uniform(width / iw, height / ih),
    ));
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    Ok(())
}

/// Draw wrapped text in layer-local units under `transform`.
///
/// Line `i` occupies the band starting at `i * fontSize * lineHeight`; each shaped line is
/// centered vertically in its band and offset horizontally per `textAlign`.
fn draw_text(
    engine: &mut TextEngine,
    fonts: &mut HashMap<(u64, u32), vello_cpu::peniko::FontData>,
    ctx: &mut vello_cpu::RenderContext,
    style: &TextContent,
    box_width: f64,
    transform: Affine,
) -> ComposerResult<()> {
    let color = parse_css_color(&style.color)?;
    let brush = TextBrush {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    };
    let size = style.font_size as f32;
    let band = style.font_size * style.line_height;

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        brush.r, brush.g, brush.b, brush.a,
    ));

    for (i, line) in engine.wrap(style, box_width as f32, size).iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let layout = engine.layout_line(line, style, size, brush)?;
        let dx = f64::from(align_offset(style.text_align, box_width as f32, layout.width()));
        let dy = i as f64 * band + (band - f64::from(layout.height())) / 2.0;
        ctx.set_transform(affine_to_cpu(transform * Affine::translate((dx, dy))));

        for laid in layout.lines() {
            for item in laid.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let src = run.run().font();
                let font = fonts
                    .entry((src.data.id(), src.index))
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(src.data.data().to_vec()),
                            src.index,
                        )
                    })
                    .clone();
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
    Ok(())
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ComposerResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ComposerError::raster("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ComposerError::raster("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ComposerError::raster("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
