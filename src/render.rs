use crate::{
    core::{BezPath, Canvas, Color, Point, Rect},
    error::{PlakatError, PlakatResult},
    model::{ImageLayer, Layer, LayerCommon, ShapeLayer, Template, TextAlign, TextLayer},
    text::TextLayoutEngine,
};

/// Finished raster output of one compositing run.
///
/// The buffer is tightly packed RGBA8, row-major, premultiplied alpha (the
/// surface starts opaque white, so in practice every pixel ends up with
/// alpha 255 and premultiplied equals straight). Encoding to PNG or any
/// other container is the caller's job.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl RasterImage {
    /// RGBA bytes of one pixel, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|px| [px[0], px[1], px[2], px[3]])
    }
}

/// Fill used for image placeholders that do not request a color fill.
const PLACEHOLDER_FILL: Color = Color::rgb(0xee, 0xee, 0xee);

/// Composite a validated template into a raster image.
///
/// Layers are authored topmost-first and painted back-to-front; hidden and
/// unrecognized layers are skipped. The only fatal condition is a canvas
/// larger than the rasterizer's surface limit.
#[tracing::instrument(skip(template), fields(
    width = template.canvas_width,
    height = template.canvas_height,
    layers = template.layers.len(),
))]
pub fn render(template: &Template) -> PlakatResult<RasterImage> {
    let canvas = template.canvas();
    let (width, height) = surface_dims(canvas)?;

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint(to_paint(Color::WHITE, 1.0));
    ctx.fill_rect(&rect_to_cpu(Rect::new(
        0.0,
        0.0,
        f64::from(canvas.width),
        f64::from(canvas.height),
    )));

    let mut engine = TextLayoutEngine::new();

    // Reverse walk over a borrow; the caller's authored order is never
    // reordered in place.
    for layer in template.layers.iter().rev() {
        paint_layer(&mut ctx, &mut engine, layer)?;
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(RasterImage {
        width: canvas.width,
        height: canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn surface_dims(canvas: Canvas) -> PlakatResult<(u16, u16)> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(PlakatError::internal(
            "canvas dimensions must be positive (template was not validated)",
        ));
    }
    let width: u16 = canvas.width.try_into().map_err(|_| {
        PlakatError::allocation(format!(
            "canvas width {} exceeds the {} px surface limit",
            canvas.width,
            u16::MAX
        ))
    })?;
    let height: u16 = canvas.height.try_into().map_err(|_| {
        PlakatError::allocation(format!(
            "canvas height {} exceeds the {} px surface limit",
            canvas.height,
            u16::MAX
        ))
    })?;
    Ok((width, height))
}

fn paint_layer(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    layer: &Layer,
) -> PlakatResult<()> {
    match layer {
        Layer::Unknown => {
            tracing::debug!("skipping layer with unrecognized type tag");
            Ok(())
        }
        Layer::Text(t) => with_layer_scope(ctx, &t.common, |ctx, alpha| {
            paint_text(ctx, engine, t, alpha)?;
            stroke_border(ctx, &t.common, layer_rect(&t.common), 0.0, alpha);
            Ok(())
        }),
        Layer::Image(i) => with_layer_scope(ctx, &i.common, |ctx, alpha| {
            paint_image(ctx, i, alpha);
            stroke_border(ctx, &i.common, floored_rect(&i.common), i.corner_radius, alpha);
            Ok(())
        }),
        Layer::Shape(s) => with_layer_scope(ctx, &s.common, |ctx, alpha| {
            paint_shape(ctx, s, alpha);
            stroke_border(ctx, &s.common, floored_rect(&s.common), s.corner_radius, alpha);
            Ok(())
        }),
    }
}

/// Run one layer's paint operations with the layer's opacity scoped to them.
///
/// The clamped alpha is multiplied into every individual paint, so a
/// translucent layer's stroke blends against its own already-blended fill,
/// and text blends over its own background — the same result as setting a
/// global alpha for the layer and restoring it afterwards. Because the
/// alpha is a per-layer parameter rather than ambient context, it cannot
/// leak into the next layer.
fn with_layer_scope<F>(
    ctx: &mut vello_cpu::RenderContext,
    common: &LayerCommon,
    f: F,
) -> PlakatResult<()>
where
    F: FnOnce(&mut vello_cpu::RenderContext, f64) -> PlakatResult<()>,
{
    if !common.visible {
        tracing::trace!(id = %common.id, "skipping hidden layer");
        return Ok(());
    }
    tracing::trace!(id = %common.id, "painting layer");

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    f(ctx, layer_alpha(common.opacity))
}

fn paint_text(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    t: &TextLayer,
    alpha: f64,
) -> PlakatResult<()> {
    let c = &t.common;

    if t.use_background {
        let pad = finite_or_zero(t.bg_padding).max(0.0);
        let x0 = (finite_or_zero(c.x) - pad).round();
        let y0 = (finite_or_zero(c.y) - pad).round();
        let w = (clamp_dim(c.width) + 2.0 * pad).round();
        let h = (clamp_dim(c.height) + 2.0 * pad).round();
        ctx.set_paint(to_paint(t.background_color, alpha));
        ctx.fill_rect(&rect_to_cpu(Rect::new(x0, y0, x0 + w, y0 + h)));
    }

    if t.text.is_empty() {
        return Ok(());
    }

    let layout = engine.layout_line(&t.text, &t.font, t.size, t.bold, t.italic, t.color)?;

    // Anchor semantics match the editor preview: the anchor is a point on
    // the layer box and the measured line hangs off it per alignment.
    let factor = align_factor(t.text_align);
    let anchor_x = text_anchor(finite_or_zero(c.x), clamp_dim(c.width), t.text_align);
    let origin_x = anchor_x - f64::from(layout.width()) * factor;
    let origin_y = finite_or_zero(c.y).round();
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin_x, origin_y)));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(to_paint(brush, alpha));

            let font = {
                let f = run.run().font();
                engine.backend_font(f.data.id(), f.index, f.data.as_ref())
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

fn paint_image(ctx: &mut vello_cpu::RenderContext, i: &ImageLayer, alpha: f64) {
    let fill = if i.use_color_fill {
        i.fill_color
    } else {
        PLACEHOLDER_FILL
    };
    fill_outline(ctx, floored_rect(&i.common), i.corner_radius, fill, alpha);
}

fn paint_shape(ctx: &mut vello_cpu::RenderContext, s: &ShapeLayer, alpha: f64) {
    let rect = floored_rect(&s.common);
    fill_outline(ctx, rect, s.corner_radius, s.fill_color, alpha);

    if s.stroke_width > 0.0 && s.stroke_width.is_finite() {
        stroke_outline(ctx, rect, s.corner_radius, s.stroke_width, s.stroke_color, alpha);
    }
}

fn fill_outline(
    ctx: &mut vello_cpu::RenderContext,
    rect: Rect,
    radius: f64,
    color: Color,
    alpha: f64,
) {
    ctx.set_paint(to_paint(color, alpha));
    if radius > 0.0 && radius.is_finite() {
        ctx.fill_path(&bezpath_to_cpu(&rounded_rect_path(rect, radius)));
    } else {
        ctx.fill_rect(&rect_to_cpu(rect));
    }
}

/// Shared border step: stroke the layer outline after its fill, reusing the
/// fill geometry.
fn stroke_border(
    ctx: &mut vello_cpu::RenderContext,
    common: &LayerCommon,
    rect: Rect,
    radius: f64,
    alpha: f64,
) {
    if common.border_width > 0.0 && common.border_width.is_finite() {
        stroke_outline(ctx, rect, radius, common.border_width, common.border_color, alpha);
    }
}

fn stroke_outline(
    ctx: &mut vello_cpu::RenderContext,
    rect: Rect,
    radius: f64,
    width: f64,
    color: Color,
    alpha: f64,
) {
    // Odd integer widths are nudged half a pixel so the stroke lands on
    // pixel centers, matching the editor preview.
    let off = stroke_offset(width);
    let rect = Rect::new(rect.x0 + off, rect.y0 + off, rect.x1 + off, rect.y1 + off);

    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
    ctx.set_paint(to_paint(color, alpha));
    if radius > 0.0 && radius.is_finite() {
        ctx.stroke_path(&bezpath_to_cpu(&rounded_rect_path(rect, radius)));
    } else {
        ctx.stroke_rect(&rect_to_cpu(rect));
    }
}

fn layer_alpha(opacity: f64) -> f64 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Negative layer dimensions are an upstream validation gap; clamp to zero
/// instead of failing the render.
fn clamp_dim(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Placeholder/shape geometry floors positions and sizes.
fn floored_rect(c: &LayerCommon) -> Rect {
    let x = finite_or_zero(c.x).floor();
    let y = finite_or_zero(c.y).floor();
    let w = clamp_dim(c.width).floor();
    let h = clamp_dim(c.height).floor();
    Rect::new(x, y, x + w, y + h)
}

/// Unrounded layer box, used for text borders.
fn layer_rect(c: &LayerCommon) -> Rect {
    let x = finite_or_zero(c.x);
    let y = finite_or_zero(c.y);
    Rect::new(x, y, x + clamp_dim(c.width), y + clamp_dim(c.height))
}

fn align_factor(align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => 0.5,
        TextAlign::Right => 1.0,
    }
}

/// Text anchors round to the nearest integer (unlike shape geometry, which
/// floors); the asymmetry is part of the output contract.
fn text_anchor(x: f64, width: f64, align: TextAlign) -> f64 {
    (x + width * align_factor(align)).round()
}

fn stroke_offset(width: f64) -> f64 {
    if width.fract() == 0.0 && (width as i64) % 2 == 1 {
        0.5
    } else {
        0.0
    }
}

/// Rounded-rect outline: clockwise from the top edge, four edges shortened
/// by the radius and joined by quarter arcs (cubic approximation). The same
/// path is used for fill and stroke so borders hug the fill exactly.
fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    const K: f64 = 0.552_284_749_830_793_4;

    let r = radius
        .min(rect.width() / 2.0)
        .min(rect.height() / 2.0)
        .max(0.0);
    let k = K * r;
    let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);

    let mut p = BezPath::new();
    p.move_to((x0 + r, y0));
    p.line_to((x1 - r, y0));
    p.curve_to((x1 - r + k, y0), (x1, y0 + r - k), (x1, y0 + r));
    p.line_to((x1, y1 - r));
    p.curve_to((x1, y1 - r + k), (x1 - r + k, y1), (x1 - r, y1));
    p.line_to((x0 + r, y1));
    p.curve_to((x0 + r - k, y1), (x0, y1 - r + k), (x0, y1 - r));
    p.line_to((x0, y0 + r));
    p.curve_to((x0, y0 + r - k), (x0 + r - k, y0), (x0 + r, y0));
    p.close_path();
    p
}

fn to_paint(c: Color, alpha: f64) -> vello_cpu::peniko::Color {
    let a = if alpha < 1.0 {
        (f64::from(c.a) * alpha).round() as u8
    } else {
        c.a
    };
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn shape_geometry_floors_positions_and_sizes() {
        let c = LayerCommon {
            id: String::new(),
            name: String::new(),
            x: 10.7,
            y: 10.3,
            width: 50.9,
            height: 20.2,
            visible: true,
            opacity: 1.0,
            border_width: 0.0,
            border_color: Color::BLACK,
        };
        let r = floored_rect(&c);
        assert_eq!((r.x0, r.y0, r.x1, r.y1), (10.0, 10.0, 60.0, 30.0));
    }

    #[test]
    fn text_anchor_rounds_per_alignment() {
        assert_eq!(text_anchor(10.7, 50.9, TextAlign::Left), 11.0);
        assert_eq!(text_anchor(10.7, 50.9, TextAlign::Center), 36.0);
        assert_eq!(text_anchor(10.7, 50.9, TextAlign::Right), 62.0);
    }

    #[test]
    fn odd_integer_strokes_get_half_pixel_offset() {
        assert_eq!(stroke_offset(1.0), 0.5);
        assert_eq!(stroke_offset(2.0), 0.0);
        assert_eq!(stroke_offset(3.0), 0.5);
        assert_eq!(stroke_offset(1.5), 0.0);
        assert_eq!(stroke_offset(0.5), 0.0);
    }

    #[test]
    fn negative_dimensions_clamp_to_zero() {
        let c = LayerCommon {
            id: String::new(),
            name: String::new(),
            x: 5.0,
            y: 5.0,
            width: -40.0,
            height: f64::NAN,
            visible: true,
            opacity: 1.0,
            border_width: 0.0,
            border_color: Color::BLACK,
        };
        let r = floored_rect(&c);
        assert_eq!(r.width(), 0.0);
        assert_eq!(r.height(), 0.0);
    }

    #[test]
    fn layer_alpha_clamps_and_defaults() {
        assert_eq!(layer_alpha(0.5), 0.5);
        assert_eq!(layer_alpha(-1.0), 0.0);
        assert_eq!(layer_alpha(2.0), 1.0);
        assert_eq!(layer_alpha(f64::NAN), 1.0);
    }

    #[test]
    fn rounded_path_starts_on_top_edge_and_closes() {
        let path = rounded_rect_path(Rect::new(0.0, 0.0, 100.0, 50.0), 8.0);
        let els: Vec<_> = path.elements().to_vec();
        assert!(matches!(els.first(), Some(PathEl::MoveTo(p)) if p.x == 8.0 && p.y == 0.0));
        assert!(matches!(els.last(), Some(PathEl::ClosePath)));
        // four corners -> four cubics
        let cubics = els
            .iter()
            .filter(|e| matches!(e, PathEl::CurveTo(..)))
            .count();
        assert_eq!(cubics, 4);
    }

    #[test]
    fn rounded_path_radius_clamps_to_half_extent() {
        let path = rounded_rect_path(Rect::new(0.0, 0.0, 10.0, 10.0), 100.0);
        let els = path.elements();
        assert!(matches!(els.first(), Some(PathEl::MoveTo(p)) if p.x == 5.0 && p.y == 0.0));
    }

    #[test]
    fn surface_limit_is_enforced() {
        let err = surface_dims(Canvas {
            width: 70_000,
            height: 10,
        })
        .unwrap_err();
        assert!(matches!(err, PlakatError::Allocation(_)));
    }
}
