use crate::{
    core::{Canvas, Color},
    error::{PlakatError, PlakatResult},
};

/// A validated render request: canvas dimensions plus an ordered layer stack.
///
/// The layer sequence is authored topmost-first (the first layer in the list
/// is visually on top); the compositor paints it back-to-front. Field names
/// follow the camelCase wire format produced by the template editor.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub layers: Vec<Layer>,
}

/// One paintable element, discriminated by its `type` tag.
///
/// Tags not known to this crate deserialize as [`Layer::Unknown`] and are
/// skipped at paint time; a single unrecognized layer never fails the whole
/// template.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    Text(TextLayer),
    Image(ImageLayer),
    Shape(ShapeLayer),
    #[serde(other)]
    Unknown,
}

/// Fields shared by every concrete layer variant.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerCommon {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// 0..1, clamped at paint time.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub border_width: f64,
    #[serde(default)]
    pub border_color: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub size: f64,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub use_background: bool,
    #[serde(default = "default_background_color")]
    pub background_color: Color,
    #[serde(default)]
    pub bg_padding: f64,
}

/// Image layers render as flat placeholder rectangles; no bitmap source is
/// decoded here.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub use_color_fill: bool,
    #[serde(default = "default_fill_color")]
    pub fill_color: Color,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeLayer {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default = "default_fill_color")]
    pub fill_color: Color,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_color: Color,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

fn default_font() -> String {
    "sans-serif".to_string()
}

fn default_font_size() -> f64 {
    16.0
}

fn default_background_color() -> Color {
    Color::WHITE
}

fn default_fill_color() -> Color {
    Color::rgb(0xcc, 0xcc, 0xcc)
}

impl Template {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.canvas_width,
            height: self.canvas_height,
        }
    }

    pub fn validate(&self) -> PlakatResult<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(PlakatError::validation("canvas width/height must be > 0"));
        }

        for layer in &self.layers {
            let Some(common) = layer.common() else {
                continue;
            };
            common.validate()?;
            match layer {
                Layer::Text(t) => {
                    if !t.size.is_finite() || t.size <= 0.0 {
                        return Err(PlakatError::validation(format!(
                            "layer '{}': text size must be finite and > 0",
                            common.id
                        )));
                    }
                    if !t.bg_padding.is_finite() || t.bg_padding < 0.0 {
                        return Err(PlakatError::validation(format!(
                            "layer '{}': bgPadding must be >= 0",
                            common.id
                        )));
                    }
                }
                Layer::Image(i) => {
                    validate_radius(&common.id, i.corner_radius)?;
                }
                Layer::Shape(s) => {
                    validate_radius(&common.id, s.corner_radius)?;
                    if !s.stroke_width.is_finite() || s.stroke_width < 0.0 {
                        return Err(PlakatError::validation(format!(
                            "layer '{}': strokeWidth must be >= 0",
                            common.id
                        )));
                    }
                }
                Layer::Unknown => {}
            }
        }

        Ok(())
    }
}

fn validate_radius(id: &str, radius: f64) -> PlakatResult<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(PlakatError::validation(format!(
            "layer '{id}': cornerRadius must be >= 0"
        )));
    }
    Ok(())
}

impl LayerCommon {
    fn validate(&self) -> PlakatResult<()> {
        for (field, v) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("opacity", self.opacity),
        ] {
            if !v.is_finite() {
                return Err(PlakatError::validation(format!(
                    "layer '{}': {field} must be a finite number",
                    self.id
                )));
            }
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(PlakatError::validation(format!(
                "layer '{}': borderWidth must be >= 0",
                self.id
            )));
        }
        Ok(())
    }
}

impl Layer {
    /// Shared base fields, or `None` for unrecognized layer tags.
    pub fn common(&self) -> Option<&LayerCommon> {
        match self {
            Layer::Text(t) => Some(&t.common),
            Layer::Image(i) => Some(&i.common),
            Layer::Shape(s) => Some(&s.common),
            Layer::Unknown => None,
        }
    }
}
