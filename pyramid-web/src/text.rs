/// Label text: measuring with a 2D canvas and painting sprite textures
use pyramid_core::label::{FontSpec, LabelStyle, TextMeasure};
use pyramid_core::{ApproxMeasure, Rgb, Sprite};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::dom;

/// Measures with the browser's font engine via a scratch canvas
pub struct CanvasMeasure {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMeasure {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let canvas = dom::create_canvas(document)?;
        Ok(Self {
            ctx: dom::context_2d(&canvas)?,
        })
    }
}

impl TextMeasure for CanvasMeasure {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        self.ctx.set_font(&font.css());
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width() as f32,
            Err(_) => ApproxMeasure.text_width(text, font),
        }
    }
}

fn css_rgba(color: Rgb, alpha: f32) -> String {
    format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, alpha)
}

/// Draw a label into a fresh canvas sized by its layout.
pub fn paint_label(document: &Document, sprite: &Sprite) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = dom::create_canvas(document)?;
    let (width, height) = (sprite.layout.canvas_width, sprite.layout.canvas_height);
    canvas.set_width(width);
    canvas.set_height(height);

    // resizing resets the context state, so style it afterwards
    let ctx = dom::context_2d(&canvas)?;
    let (w, h) = (width as f64, height as f64);
    match sprite.style {
        LabelStyle::Plain => ctx.clear_rect(0.0, 0.0, w, h),
        LabelStyle::Card { background, alpha } => {
            ctx.set_fill_style_str(&css_rgba(background, alpha));
            ctx.fill_rect(0.0, 0.0, w, h);
        }
    }

    ctx.set_font(&sprite.font.css());
    ctx.set_fill_style_str(&sprite.color.to_hex_string());
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text(&sprite.text, w / 2.0, h / 2.0)?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_rgba() {
        assert_eq!(css_rgba(Rgb::BLACK, 0.55), "rgba(0, 0, 0, 0.55)");
    }
}
