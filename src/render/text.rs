use std::borrow::Cow;

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::scene::layer::{FontStyle, TextAlign, TextContent};

/// RGBA8 brush carried through parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Break `text` into lines no wider than `max_width`.
///
/// Paragraphs split on `'\n'`, words on spaces. Each candidate line is measured whole and the
/// line breaks before the first word that no longer fits; a single word wider than the box
/// sits on its own line.
pub fn wrap_lines<M>(text: &str, max_width: f32, mut measure: M) -> Vec<String>
where
    M: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        lines.push(line);
    }
    lines
}

/// Horizontal offset of a line of width `line_width` inside a box of width `box_width`.
pub fn align_offset(align: TextAlign, box_width: f32, line_width: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => (box_width - line_width) / 2.0,
        TextAlign::Right => box_width - line_width,
    }
}

/// Shapes single lines of text with parley; line breaking happens in [`wrap_lines`].
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine").finish_non_exhaustive()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register font bytes, making their family resolvable by name. Returns the family name.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> ComposerResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ComposerError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ComposerError::validation("registered font family has no name"))?;
        Ok(name.to_string())
    }

    /// Lay out one unbroken line with the layer's font settings at `size_px`.
    pub fn layout_line(
        &mut self,
        line: &str,
        style: &TextContent,
        size_px: f32,
        brush: TextBrush,
    ) -> ComposerResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ComposerError::validation(
                "font size must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, line, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(style.font_family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.font_weight)),
        ));
        if style.font_style == FontStyle::Italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(line);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of `line` in pixels.
    pub fn measure(&mut self, line: &str, style: &TextContent, size_px: f32) -> f32 {
        self.layout_line(line, style, size_px, TextBrush::default())
            .map(|l| l.width())
            .unwrap_or(0.0)
    }

    /// Wrapped, transformed display lines of a text layer of box width `box_width`.
    pub fn wrap(&mut self, style: &TextContent, box_width: f32, size_px: f32) -> Vec<String> {
        let text = style.display_text();
        wrap_lines(&text, box_width, |candidate| {
            self.measure(candidate, style, size_px)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
