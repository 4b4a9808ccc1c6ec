/// Text sprite sizing.
///
/// A label is drawn into an offscreen canvas sized around its text and shown
/// as a camera-facing sprite. The canvas size decides the sprite's world
/// scale, so the same layout math runs with a real text measurer (web) or an
/// estimate (terminal, tests).

use crate::theme::Rgb;

/// Canvas pixels per world unit for sprite scaling
pub const PIXELS_PER_UNIT: f32 = 50.0;

/// Horizontal padding added around the measured text, in pixels
const TEXT_PADDING: f32 = 40.0;

pub const LABEL_FAMILY: &str = "\"Inter\", Arial, sans-serif";
pub const CARD_FAMILY: &str = "Inter, Arial";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
    pub bold: bool,
    pub family: &'static str,
}

impl FontSpec {
    pub fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            bold: true,
            family: LABEL_FAMILY,
        }
    }

    /// CSS shorthand, e.g. `bold 50px "Inter", Arial, sans-serif`
    pub fn css(&self) -> String {
        if self.bold {
            format!("bold {}px {}", self.size_px, self.family)
        } else {
            format!("{}px {}", self.size_px, self.family)
        }
    }
}

/// How the label canvas is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelStyle {
    /// Text only, transparent background, hidden behind geometry
    Plain,
    /// Text on a translucent card, always drawn on top
    Card { background: Rgb, alpha: f32 },
}

impl LabelStyle {
    pub fn card() -> Self {
        LabelStyle::Card {
            background: Rgb::BLACK,
            alpha: 0.55,
        }
    }

    pub fn depth_test(&self) -> bool {
        matches!(self, LabelStyle::Plain)
    }
}

/// Measures rendered text width in pixels
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
}

/// Per-glyph advance estimate for when no text backend is around
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        let em: f32 = text
            .chars()
            .map(|c| match c {
                'i' | 'l' | 'j' | 'I' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.28,
                ' ' | 'f' | 't' | 'r' => 0.33,
                'm' | 'w' | 'M' | 'W' => 0.85,
                c if c.is_ascii_uppercase() => 0.68,
                c if c.is_ascii_digit() => 0.56,
                _ => 0.55,
            })
            .sum();
        let weight = if font.bold { 1.06 } else { 1.0 };
        em * font.size_px * weight
    }
}

/// Canvas dimensions and world-space scale of one label sprite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl SpriteLayout {
    pub fn measure(text: &str, font: &FontSpec, style: &LabelStyle, measure: &dyn TextMeasure) -> Self {
        let text_width = measure.text_width(text, font);
        let (canvas_width, canvas_height) = match style {
            // canvas.width truncates fractional pixels
            LabelStyle::Plain => (
                (text_width + TEXT_PADDING).max(1.0) as u32,
                (font.size_px + TEXT_PADDING) as u32,
            ),
            LabelStyle::Card { .. } => (
                (text_width + TEXT_PADDING).ceil().max(1.0) as u32,
                (font.size_px + TEXT_PADDING + 10.0) as u32,
            ),
        };
        Self {
            canvas_width,
            canvas_height,
            scale_x: canvas_width as f32 / PIXELS_PER_UNIT,
            scale_y: canvas_height as f32 / PIXELS_PER_UNIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedMeasure(f32);

    impl TextMeasure for FixedMeasure {
        fn text_width(&self, _text: &str, _font: &FontSpec) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_css_font() {
        assert_eq!(
            FontSpec::bold(50.0).css(),
            "bold 50px \"Inter\", Arial, sans-serif"
        );
        let card = FontSpec {
            size_px: 120.0,
            bold: false,
            family: CARD_FAMILY,
        };
        assert_eq!(card.css(), "120px Inter, Arial");
    }

    #[test]
    fn test_plain_layout_truncates() {
        let layout = SpriteLayout::measure("x", &FontSpec::bold(50.0), &LabelStyle::Plain, &FixedMeasure(210.7));
        assert_eq!(layout.canvas_width, 250);
        assert_eq!(layout.canvas_height, 90);
        assert_relative_eq!(layout.scale_x, 5.0);
        assert_relative_eq!(layout.scale_y, 1.8);
    }

    #[test]
    fn test_card_layout_rounds_up() {
        let font = FontSpec {
            size_px: 120.0,
            bold: false,
            family: CARD_FAMILY,
        };
        let layout = SpriteLayout::measure("x", &font, &LabelStyle::card(), &FixedMeasure(210.2));
        assert_eq!(layout.canvas_width, 251);
        assert_eq!(layout.canvas_height, 170);
        assert!(!LabelStyle::card().depth_test());
    }

    #[test]
    fn test_approx_measure_scales_with_font() {
        let small = ApproxMeasure.text_width("Local Service", &FontSpec::bold(32.0));
        let large = ApproxMeasure.text_width("Local Service", &FontSpec::bold(64.0));
        assert!(small > 0.0);
        assert_relative_eq!(large, small * 2.0, epsilon = 1e-3);
    }
}
