use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared_str::SharedStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Smallest rect covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow the rect by `pad` on every side.
    pub fn inflate(&self, pad: f64) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.w + pad * 2.0,
            self.h + pad * 2.0,
        )
    }
}

/// Logical (CSS-pixel) size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            dpr: 1.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("expected 3, 6 or 8 hex digits, got {0}")]
    BadLength(usize),
    #[error("invalid hex digit in {0:?}")]
    BadDigit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !hex.is_ascii() {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }
        let byte = |i: usize, len: usize| -> Result<u8, ColorParseError> {
            let digits = &hex[i..i + len];
            let v = u8::from_str_radix(digits, 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))?;
            // `#abc` expands each nibble: a -> aa
            Ok(if len == 1 { v * 17 } else { v })
        };
        match hex.len() {
            3 => Ok(Self::from_rgb8(byte(0, 1)?, byte(1, 1)?, byte(2, 1)?)),
            6 => Ok(Self::from_rgb8(byte(0, 2)?, byte(2, 2)?, byte(4, 2)?)),
            8 => {
                let mut c = Self::from_rgb8(byte(0, 2)?, byte(2, 2)?, byte(4, 2)?);
                c.a = f32::from(byte(6, 2)?) / 255.0;
                Ok(c)
            }
            n => Err(ColorParseError::BadLength(n)),
        }
    }

    /// Lenient variant of [`Color::from_hex`]: anything unparseable is white.
    pub fn from_hex_or_white(s: &str) -> Self {
        Self::from_hex(s).unwrap_or(Self::WHITE)
    }

    /// `#rrggbb` (alpha is dropped).
    pub fn to_hex(&self) -> String {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// External identifier of a persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub SharedStr);

impl ItemId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(SharedStr::from(s))
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(SharedStr::from(s))
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId(SharedStr::from(n.to_string()))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Engine-local identity of a live overlay item. Allocated monotonically,
/// never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#ffffff"), Ok(Color::WHITE));
        assert_eq!(Color::from_hex("#000"), Ok(Color::BLACK));
        let c = Color::from_hex("#ff000080").expect("8-digit hex parses");
        assert_eq!(c.to_hex(), "#ff0000");
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            Color::from_hex("fff"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert_eq!(Color::from_hex("#ffff"), Err(ColorParseError::BadLength(4)));
        assert!(matches!(
            Color::from_hex("#gg0000"),
            Err(ColorParseError::BadDigit(_))
        ));
        assert_eq!(Color::from_hex_or_white("红色"), Color::WHITE);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(29.9, 19.9)));
        assert!(!r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(15.0, 20.0)));
    }

    #[test]
    fn union_and_inflate() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 20.0, 30.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, 0.0, 35.0, 25.0));
        assert_eq!(a.inflate(2.0), Rect::new(-2.0, -2.0, 14.0, 14.0));
    }

    #[test]
    fn item_id_serializes_as_plain_string() {
        let id = ItemId::from(5u64);
        let json = serde_json::to_string(&id).expect("ids serialize");
        assert_eq!(json, "\"5\"");
        assert_eq!(id, ItemId::from("5"));
    }
}
