/// Browser application: owns the viewer, canvas and GPU state, wires events
use pyramid_core::{Theme, Viewer, ViewerConfig};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlCanvasElement, PointerEvent, WheelEvent, Window};

use crate::dom;
use crate::gl::GlRenderer;
use crate::text::CanvasMeasure;

/// Primary mouse button
const BUTTON_PRIMARY: i16 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DragMode {
    Rotate,
    Pan,
}

/// Left drag orbits; right or middle drag, or shift/ctrl/meta with the
/// left button, pans.
pub(crate) fn drag_mode(button: i16, modifier_held: bool) -> DragMode {
    if button == BUTTON_PRIMARY && !modifier_held {
        DragMode::Rotate
    } else {
        DragMode::Pan
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer_id: i32,
    mode: DragMode,
    last_x: f32,
    last_y: f32,
}

pub(crate) struct App {
    window: Window,
    document: Document,
    measure: CanvasMeasure,
    canvas: HtmlCanvasElement,
    renderer: GlRenderer,
    pub(crate) viewer: Viewer,
    config: ViewerConfig,
    drag: Option<Drag>,
    /// Viewport height in CSS pixels, the reference for drag distances
    css_height: f32,
}

impl App {
    pub(crate) fn new(config: ViewerConfig) -> Result<Self, JsValue> {
        let window = dom::window()?;
        let document = dom::document(&window)?;

        let theme = resolve_theme(&window, &document, &config);
        let container = document
            .get_element_by_id(&config.container)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{}", config.container)))?;

        let (width, height) = dom::viewport_size(&window);
        let measure = CanvasMeasure::new(&document)?;
        let viewer = Viewer::new(&theme, &config, &measure, width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let canvas = dom::create_canvas(&document)?;
        container.append_child(&canvas)?;
        let gl = dom::context_webgl2(&canvas)?;
        let renderer = GlRenderer::new(gl, &document, &viewer.scene)?;

        let mut app = Self {
            window,
            document,
            measure,
            canvas,
            renderer,
            viewer,
            config,
            drag: None,
            css_height: height as f32,
        };
        app.resize()?;
        log::info!("pyramid mounted in #{}", app.config.container);
        Ok(app)
    }

    pub(crate) fn resize(&mut self) -> Result<(), JsValue> {
        let (width, height) = dom::viewport_size(&self.window);
        let ratio = self.config.pixel_ratio(self.window.device_pixel_ratio());
        let (buffer_width, buffer_height) = dom::size_canvas(&self.canvas, width, height, ratio)?;
        self.viewer.resize(width, height);
        self.renderer.set_viewport(buffer_width, buffer_height);
        self.css_height = height as f32;
        log::debug!("resized to {width}x{height} @{ratio}");
        Ok(())
    }

    /// Card-style label above `anchor_y`; returns its label index.
    pub(crate) fn add_card_label(&mut self, anchor_y: f32, text: &str) -> Result<usize, JsValue> {
        let index = self.viewer.scene.add_card_label(anchor_y, text, &self.measure);
        self.renderer.sync_labels(&self.document, &self.viewer.scene)?;
        Ok(index)
    }

    /// One animation frame; `timestamp` is the rAF clock in milliseconds.
    pub(crate) fn frame(&mut self, timestamp: f64) {
        self.viewer.tick(timestamp / 1000.0);
        self.renderer.render(&self.viewer.scene, &self.viewer.camera);
    }

    fn pointer_down(&mut self, event: &PointerEvent) {
        let modifier = event.shift_key() || event.ctrl_key() || event.meta_key();
        self.drag = Some(Drag {
            pointer_id: event.pointer_id(),
            mode: drag_mode(event.button(), modifier),
            last_x: event.client_x() as f32,
            last_y: event.client_y() as f32,
        });
        // keep receiving moves when the pointer leaves the canvas
        let _ = self.canvas.set_pointer_capture(event.pointer_id());
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if drag.pointer_id != event.pointer_id() {
            return;
        }
        let (x, y) = (event.client_x() as f32, event.client_y() as f32);
        let (dx, dy) = (x - drag.last_x, y - drag.last_y);
        drag.last_x = x;
        drag.last_y = y;

        let controls = &mut self.viewer.controls;
        match drag.mode {
            DragMode::Rotate => controls.pointer_rotate(dx, dy, self.css_height),
            DragMode::Pan => controls.pan(dx, dy, self.css_height, &self.viewer.camera),
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) {
        if self.drag.map(|d| d.pointer_id) == Some(event.pointer_id()) {
            self.drag = None;
            let _ = self.canvas.release_pointer_capture(event.pointer_id());
        }
    }

    fn wheel(&mut self, event: &WheelEvent) {
        event.prevent_default();
        self.viewer.controls.wheel(event.delta_y() as f32);
    }
}

/// Custom properties win over config overrides, which win over built-ins.
fn resolve_theme(window: &Window, document: &Document, config: &ViewerConfig) -> Theme {
    Theme::resolve(|name| {
        dom::css_variable(window, document, name).or_else(|| config.theme_value(name))
    })
}

fn request_animation_frame(window: &Window, callback: &Closure<dyn FnMut(f64)>) {
    if let Err(err) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {err:?}");
    }
}

/// Register a listener that lives as long as the page.
fn listen<E, F>(target: &web_sys::EventTarget, kind: &str, mut handler: F) -> Result<(), JsValue>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    });
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Hook up window resize, pointer and wheel input, then start the frame loop.
pub(crate) fn run(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
    let (window, canvas) = {
        let app = app.borrow();
        (app.window.clone(), app.canvas.clone())
    };

    let state = app.clone();
    listen(&window, "resize", move |_: Event| {
        if let Err(err) = state.borrow_mut().resize() {
            log::error!("resize failed: {err:?}");
        }
    })?;

    let state = app.clone();
    listen(&canvas, "pointerdown", move |e: PointerEvent| state.borrow_mut().pointer_down(&e))?;
    let state = app.clone();
    listen(&canvas, "pointermove", move |e: PointerEvent| state.borrow_mut().pointer_move(&e))?;
    for kind in ["pointerup", "pointercancel"] {
        let state = app.clone();
        listen(&canvas, kind, move |e: PointerEvent| state.borrow_mut().pointer_up(&e))?;
    }
    let state = app.clone();
    listen(&canvas, "wheel", move |e: WheelEvent| state.borrow_mut().wheel(&e))?;
    listen(&canvas, "contextmenu", |e: Event| e.prevent_default())?;

    // The closure re-arms itself each frame through this shared slot
    let slot: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = slot.clone();
    let frame_window = window.clone();
    *slot.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        app.borrow_mut().frame(timestamp);
        if let Some(callback) = next.borrow().as_ref() {
            request_animation_frame(&frame_window, callback);
        }
    }));
    if let Some(callback) = slot.borrow().as_ref() {
        request_animation_frame(&window, callback);
    }
    Ok(())
}
