/// Pyramid Core Library - platform-free model of the layered pyramid diagram
///
/// Theme resolution, layer descriptors, frustum geometry, the scene graph
/// with its label sprites, camera and orbit controls, and the tween timeline
/// behind the entrance animation. Front ends only draw what this builds.

pub mod config;
pub mod entrance;
pub mod geometry;
pub mod label;
pub mod layers;
pub mod orbit;
pub mod projection;
pub mod scene;
pub mod theme;
pub mod transform;
pub mod tween;

// Re-export commonly used types
pub use config::{ConfigError, ViewerConfig};
pub use entrance::{AnimTarget, Entrance};
pub use geometry::{Mesh, Triangle, Vertex};
pub use label::{ApproxMeasure, FontSpec, LabelStyle, SpriteLayout, TextMeasure};
pub use layers::{default_layers, LabelPlacement, LayerDescriptor, LayerError};
pub use orbit::{OrbitControls, OrbitSettings};
pub use projection::Camera;
pub use scene::{build_layer, Scene, SceneMesh, Sprite, StandardMaterial};
pub use theme::{Rgb, Theme, ThemeError};
pub use transform::{RotationState, Transform};
pub use tween::{Animate, Ease, Timeline, TweenError};

/// Everything a front end sets up before its first frame
pub struct Viewer {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub timeline: Option<Timeline<AnimTarget>>,
    ease: Ease,
    /// Clock reading of the first tick after the entrance was queued
    anim_origin: Option<f64>,
}

impl Viewer {
    /// Build the default pyramid for a `width` x `height` viewport.
    pub fn new(
        theme: &Theme,
        config: &ViewerConfig,
        measure: &dyn TextMeasure,
        width: u32,
        height: u32,
    ) -> Result<Self, LayerError> {
        let mut scene = Scene::build(theme, &default_layers(theme), measure)?;
        let ease = config.entrance_ease();
        let timeline = if config.animate {
            Some(Entrance::start_with(&mut scene, ease))
        } else {
            Entrance::settle(&mut scene);
            None
        };
        Ok(Self {
            scene,
            camera: Camera::new(width, height),
            controls: OrbitControls::new(config.orbit_settings()),
            timeline,
            ease,
            anim_origin: None,
        })
    }

    /// Per-frame step: `now` is any monotonic clock in seconds.
    pub fn tick(&mut self, now: f64) {
        if let Some(timeline) = self.timeline.as_mut() {
            let origin = *self.anim_origin.get_or_insert(now);
            let elapsed = (now - origin) as f32;
            timeline.advance_to(elapsed, &mut self.scene);
            if timeline.is_complete() {
                log::debug!("entrance finished at {elapsed:.2}s");
                self.timeline = None;
                self.anim_origin = None;
            }
        }
        self.controls.update(&mut self.camera);
    }

    /// Restart the entrance from the resting pose.
    pub fn replay(&mut self) {
        Entrance::settle(&mut self.scene);
        self.timeline = Some(Entrance::start_with(&mut self.scene, self.ease));
        self.anim_origin = None;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    pub fn is_animating(&self) -> bool {
        self.timeline.is_some()
    }
}
