use crate::error::{PlakatError, PlakatResult};

pub use kurbo::{BezPath, Point, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> PlakatResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlakatError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Straight (non-premultiplied) RGBA8 color.
///
/// Serializes as a CSS-style hex string (`#rrggbb`, or `#rrggbbaa` when the
/// alpha is not 255); accepts `#rgb`, `#rrggbb` and `#rrggbbaa` on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(s: &str) -> PlakatResult<Self> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| PlakatError::validation(format!("color '{s}' must start with '#'")))?;

        let nibble = |c: u8| -> PlakatResult<u8> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| PlakatError::validation(format!("color '{s}' has non-hex digit")))
        };

        let b = digits.as_bytes();
        match b.len() {
            3 => {
                let r = nibble(b[0])?;
                let g = nibble(b[1])?;
                let bl = nibble(b[2])?;
                Ok(Self::rgb(r << 4 | r, g << 4 | g, bl << 4 | bl))
            }
            6 | 8 => {
                let byte = |i: usize| -> PlakatResult<u8> {
                    Ok(nibble(b[i])? << 4 | nibble(b[i + 1])?)
                };
                let a = if b.len() == 8 { byte(6)? } else { 0xff };
                Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
            }
            _ => Err(PlakatError::validation(format!(
                "color '{s}' must be #rgb, #rrggbb or #rrggbbaa"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Color {
    type Err = PlakatError;

    fn from_str(s: &str) -> PlakatResult<Self> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_variants() {
        assert_eq!(Color::from_hex("#cccccc").unwrap(), Color::rgb(0xcc, 0xcc, 0xcc));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(
            Color::from_hex("#11223344").unwrap(),
            Color::rgba(0x11, 0x22, 0x33, 0x44)
        );
    }

    #[test]
    fn hex_parse_rejects_garbage() {
        assert!(Color::from_hex("cccccc").is_err());
        assert!(Color::from_hex("#cc").is_err());
        assert!(Color::from_hex("#ccccgg").is_err());
    }

    #[test]
    fn hex_roundtrip() {
        for c in [Color::BLACK, Color::rgb(0xee, 0xee, 0xee), Color::rgba(1, 2, 3, 4)] {
            assert_eq!(Color::from_hex(&c.to_hex()).unwrap(), c);
        }
    }

    #[test]
    fn serde_is_hex_string() {
        let s = serde_json::to_string(&Color::rgb(0xee, 0xee, 0xee)).unwrap();
        assert_eq!(s, "\"#eeeeee\"");
        let c: Color = serde_json::from_str("\"#102030\"").unwrap();
        assert_eq!(c, Color::rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn canvas_rejects_zero_dims() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(10, 0).is_err());
        assert!(Canvas::new(1, 1).is_ok());
    }
}
