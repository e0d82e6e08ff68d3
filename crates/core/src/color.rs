//! CSS color parsing and WCAG contrast math, used to spot text that is
//! invisible against its background.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*([\d.]+%?)\s*[,\s]\s*([\d.]+%?)\s*[,\s]\s*([\d.]+%?)\s*(?:[,/]\s*([\d.]+%?)\s*)?\)$")
        .expect("valid rgb regex")
});

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("aqua", (0, 255, 255)),
    ("black", (0, 0, 0)),
    ("blue", (0, 0, 255)),
    ("cyan", (0, 255, 255)),
    ("darkgray", (169, 169, 169)),
    ("darkgrey", (169, 169, 169)),
    ("fuchsia", (255, 0, 255)),
    ("gainsboro", (220, 220, 220)),
    ("gray", (128, 128, 128)),
    ("green", (0, 128, 0)),
    ("grey", (128, 128, 128)),
    ("ivory", (255, 255, 240)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
    ("lime", (0, 255, 0)),
    ("magenta", (255, 0, 255)),
    ("maroon", (128, 0, 0)),
    ("navy", (0, 0, 128)),
    ("olive", (128, 128, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("red", (255, 0, 0)),
    ("silver", (192, 192, 192)),
    ("snow", (255, 250, 250)),
    ("teal", (0, 128, 128)),
    ("white", (255, 255, 255)),
    ("whitesmoke", (245, 245, 245)),
    ("yellow", (255, 255, 0)),
];

/// An sRGB color with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses hex, `rgb()`/`rgba()`, `transparent` and common named colors.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if value == "transparent" {
            return Some(Self { a: 0.0, ..Self::BLACK });
        }
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(caps) = RGB_RE.captures(&value) {
            let channel = |i: usize| caps.get(i).and_then(|m| parse_channel(m.as_str()));
            let alpha = match caps.get(4) {
                Some(m) => parse_alpha(m.as_str())?,
                None => 1.0,
            };
            return Some(Self { r: channel(1)?, g: channel(2)?, b: channel(3)?, a: alpha });
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == value)
            .map(|&(_, (r, g, b))| Self::rgb(r, g, b))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        let pair = |hi: u8, lo: u8| hi * 16 + lo;
        match digits.as_slice() {
            [r, g, b] => Some(Self::rgb(r * 17, g * 17, b * 17)),
            [r, g, b, a] => Some(Self { a: f64::from(a * 17) / 255.0, ..Self::rgb(r * 17, g * 17, b * 17) }),
            [r1, r2, g1, g2, b1, b2] => Some(Self::rgb(pair(*r1, *r2), pair(*g1, *g2), pair(*b1, *b2))),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Self {
                a: f64::from(pair(*a1, *a2)) / 255.0,
                ..Self::rgb(pair(*r1, *r2), pair(*g1, *g2), pair(*b1, *b2))
            }),
            _ => None,
        }
    }

    /// Composites this color over an opaque background.
    pub fn blend_over(self, background: Color) -> Color {
        let mix = |fg: u8, bg: u8| (f64::from(fg) * self.a + f64::from(bg) * (1.0 - self.a)).round() as u8;
        Color::rgb(mix(self.r, background.r), mix(self.g, background.g), mix(self.b, background.b))
    }

    /// WCAG 2 relative luminance.
    pub fn relative_luminance(self) -> f64 {
        let linear = |channel: u8| {
            let c = f64::from(channel) / 255.0;
            if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        };
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// WCAG 2 contrast ratio, from 1.0 (identical) to 21.0.
    pub fn contrast_ratio(self, other: Color) -> f64 {
        let (a, b) = (self.relative_luminance(), other.relative_luminance());
        let (light, dark) = if a > b { (a, b) } else { (b, a) };
        (light + 0.05) / (dark + 0.05)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("unsupported color: {}", value))
    }
}

fn parse_channel(value: &str) -> Option<u8> {
    let number = match value.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? * 2.55,
        None => value.parse::<f64>().ok()?,
    };
    Some(number.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(value: &str) -> Option<f64> {
    let number = match value.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? / 100.0,
        None => value.parse::<f64>().ok()?,
    };
    Some(number.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#fff", Color::WHITE)]
    #[case("#000000", Color::BLACK)]
    #[case("rgb(255, 0, 0)", Color::rgb(255, 0, 0))]
    #[case("RGB(100%, 100%, 100%)", Color::WHITE)]
    #[case("navy", Color::rgb(0, 0, 128))]
    fn test_parse(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(Color::parse(input), Some(expected));
    }

    #[test]
    fn test_parse_alpha() {
        let color = Color::parse("rgba(0, 0, 0, 0.5)").unwrap();
        assert_eq!(color.a, 0.5);
        assert_eq!(Color::parse("transparent").unwrap().a, 0.0);
        assert!(Color::parse("#12").is_none());
        assert!(Color::parse("not-a-color").is_none());
    }

    #[test]
    fn test_contrast_ratio_extremes() {
        let ratio = Color::BLACK.contrast_ratio(Color::WHITE);
        assert!((ratio - 21.0).abs() < 0.01);
        assert!((Color::WHITE.contrast_ratio(Color::WHITE) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blend_over() {
        let half_black = Color { a: 0.5, ..Color::BLACK };
        assert_eq!(half_black.blend_over(Color::WHITE), Color::rgb(128, 128, 128));
    }
}
