use std::collections::HashMap;

use crate::{
    core::Color,
    error::{PlakatError, PlakatResult},
};

/// Stateful helper for shaping template text through Parley.
///
/// One engine lives for the duration of a single `render` call; it owns the
/// Parley contexts (system font collection included) plus a small cache that
/// rewraps resolved font blobs for the rasterizer.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Color>,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font_cache: HashMap::new(),
        }
    }

    /// Shape `text` as a single unwrapped line.
    ///
    /// The requested family falls back to the generic sans-serif stack when
    /// it cannot be resolved; a family that resolves to no faces at all
    /// simply yields a layout without glyph runs rather than an error.
    pub fn layout_line(
        &mut self,
        text: &str,
        font_family: &str,
        size_px: f64,
        bold: bool,
        italic: bool,
        brush: Color,
    ) -> PlakatResult<parley::Layout<Color>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PlakatError::validation(
                "text size must be finite and > 0",
            ));
        }

        let family = font_family.trim();
        let stack = if family.is_empty() || family.eq_ignore_ascii_case("sans-serif") {
            "sans-serif".to_string()
        } else {
            format!("{family}, sans-serif")
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px as f32));
        builder.push_default(parley::style::StyleProperty::FontWeight(if bold {
            parley::style::FontWeight::BOLD
        } else {
            parley::style::FontWeight::NORMAL
        }));
        builder.push_default(parley::style::StyleProperty::FontStyle(if italic {
            parley::style::FontStyle::Italic
        } else {
            parley::style::FontStyle::Normal
        }));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Color> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Rewrap a resolved font blob as the rasterizer's font type, cached by
    /// blob identity and face index.
    pub fn backend_font(
        &mut self,
        blob_id: u64,
        index: u32,
        bytes: &[u8],
    ) -> vello_cpu::peniko::FontData {
        if let Some(font) = self.font_cache.get(&(blob_id, index)) {
            return font.clone();
        }
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.to_vec()),
            index,
        );
        self.font_cache.insert((blob_id, index), font.clone());
        font
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_size() {
        let mut engine = TextLayoutEngine::new();
        assert!(
            engine
                .layout_line("x", "sans-serif", 0.0, false, false, Color::BLACK)
                .is_err()
        );
        assert!(
            engine
                .layout_line("x", "sans-serif", f64::NAN, false, false, Color::BLACK)
                .is_err()
        );
    }

    #[test]
    fn empty_text_layout_has_zero_width() {
        let mut engine = TextLayoutEngine::new();
        let layout = engine
            .layout_line("", "sans-serif", 16.0, false, false, Color::BLACK)
            .unwrap();
        assert_eq!(layout.width(), 0.0);
    }

    #[test]
    fn backend_font_is_cached_by_blob_identity() {
        let mut engine = TextLayoutEngine::new();
        let a = engine.backend_font(7, 0, &[0, 1, 2, 3]);
        let b = engine.backend_font(7, 0, &[0, 1, 2, 3]);
        assert_eq!(a.data.id(), b.data.id());
    }
}
