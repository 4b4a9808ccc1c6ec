/// Pyramid Web - WebGL2 front end compiled to WASM
///
/// Mounts the pyramid diagram into a page: reads the theme from CSS custom
/// properties, appends a canvas to the container element, and runs the
/// entrance animation and orbit controls on the browser's frame clock.
///
/// ```js
/// import init, { PyramidViewer } from "./pyramid_web.js";
/// await init();
/// const viewer = new PyramidViewer("container");
/// ```

use std::cell::RefCell;
use std::rc::Rc;

use pyramid_core::ViewerConfig;
use wasm_bindgen::prelude::*;

mod app;
mod dom;
mod gl;
mod text;

use app::App;

/// Handle to a mounted diagram
#[wasm_bindgen]
pub struct PyramidViewer {
    app: Rc<RefCell<App>>,
}

#[wasm_bindgen]
impl PyramidViewer {
    /// Mount into the element with id `container_id` (default `container`).
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: Option<String>) -> Result<PyramidViewer, JsValue> {
        let mut config = ViewerConfig::default();
        if let Some(id) = container_id {
            config.container = id;
        }
        Self::mount(config)
    }

    /// Mount with a TOML configuration document.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_toml: &str) -> Result<PyramidViewer, JsValue> {
        let config = ViewerConfig::from_toml_str(config_toml)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Self::mount(config)
    }

    fn mount(config: ViewerConfig) -> Result<PyramidViewer, JsValue> {
        let app = Rc::new(RefCell::new(App::new(config)?));
        app::run(app.clone())?;
        Ok(PyramidViewer { app })
    }

    /// Play the entrance animation again
    pub fn replay(&self) {
        self.app.borrow_mut().viewer.replay();
    }

    /// Add a card label hovering just above height `anchor_y`
    #[wasm_bindgen(js_name = addCardLabel)]
    pub fn add_card_label(&self, anchor_y: f32, text: &str) -> Result<usize, JsValue> {
        self.app.borrow_mut().add_card_label(anchor_y, text)
    }

    /// Whether the entrance animation is still running
    #[wasm_bindgen(getter)]
    pub fn animating(&self) -> bool {
        self.app.borrow().viewer.is_animating()
    }

    /// Re-read the viewport size; normally driven by the resize listener
    pub fn resize(&self) -> Result<(), JsValue> {
        self.app.borrow_mut().resize()
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
    Ok(())
}
