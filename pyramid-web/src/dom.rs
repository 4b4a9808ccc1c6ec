/// DOM access: window, theme custom properties, canvases and contexts
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, WebGl2RenderingContext, Window,
};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document(window: &Window) -> Result<Document, JsValue> {
    window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Value of a custom property on the document root, `None` when unset or blank
pub fn css_variable(window: &Window, document: &Document, name: &str) -> Option<String> {
    let root = document.document_element()?;
    let style = window.get_computed_style(&root).ok().flatten()?;
    let value = style.get_property_value(name).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Inner size of the window in CSS pixels
pub fn viewport_size(window: &Window) -> (u32, u32) {
    let dimension = |value: Result<JsValue, JsValue>| {
        value
            .ok()
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(1.0) as u32
    };
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

pub fn create_canvas(document: &Document) -> Result<HtmlCanvasElement, JsValue> {
    document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("created element is not a canvas"))
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("unexpected 2d context type"))
}

pub fn context_webgl2(canvas: &HtmlCanvasElement) -> Result<WebGl2RenderingContext, JsValue> {
    canvas
        .get_context("webgl2")?
        .ok_or_else(|| JsValue::from_str("WebGL2 unavailable"))?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| JsValue::from_str("unexpected webgl2 context type"))
}

/// Size the drawing buffer in device pixels and the element in CSS pixels.
pub fn size_canvas(
    canvas: &HtmlCanvasElement,
    css_width: u32,
    css_height: u32,
    pixel_ratio: f64,
) -> Result<(u32, u32), JsValue> {
    let width = ((css_width as f64 * pixel_ratio).round() as u32).max(1);
    let height = ((css_height as f64 * pixel_ratio).round() as u32).max(1);
    canvas.set_width(width);
    canvas.set_height(height);
    let style = canvas.style();
    style.set_property("width", &format!("{css_width}px"))?;
    style.set_property("height", &format!("{css_height}px"))?;
    Ok((width, height))
}
