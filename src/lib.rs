//! Plakat turns a declarative visual template into a raster image.
//!
//! A [`Template`] is a fixed-size canvas plus an ordered stack of typed
//! layers (text, image placeholder, shape), authored topmost-first. The
//! compositor ([`render`]) paints the stack back-to-front into an RGBA
//! surface, honoring per-layer opacity, geometry rounding, rounded corners
//! and borders, and returns the finished [`RasterImage`].
//!
//! # Pipeline overview
//!
//! 1. **Parse/validate**: JSON -> `Template` (serde), then [`Template::validate`]
//! 2. **Composite**: `render(&Template) -> RasterImage` (pure, CPU-only)
//! 3. **Encode** (caller's job): e.g. PNG via the `image` crate, as the
//!    bundled CLI does
//!
//! The compositor is deterministic and self-contained: no IO, no shared
//! state, so concurrent renders need no locking.
#![forbid(unsafe_code)]

pub mod core;
pub mod error;
pub mod model;
pub mod render;
pub mod text;

pub use crate::core::{Canvas, Color};
pub use crate::error::{PlakatError, PlakatResult};
pub use crate::model::{
    ImageLayer, Layer, LayerCommon, ShapeLayer, Template, TextAlign, TextLayer,
};
pub use crate::render::{RasterImage, render};
pub use crate::text::TextLayoutEngine;
