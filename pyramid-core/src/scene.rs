/// Scene graph for the pyramid: meshes, label sprites and lights
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::{FRAC_PI_3, TAU};

use crate::geometry::Mesh;
use crate::label::{FontSpec, LabelStyle, SpriteLayout, TextMeasure, CARD_FAMILY};
use crate::layers::{LabelPlacement, LayerDescriptor, LayerError};
use crate::theme::{Rgb, Theme};
use crate::transform::{RotationState, Transform};

/// Sides per layer; three makes the stack read as a pyramid
pub const RADIAL_SEGMENTS: u32 = 3;

/// Resting yaw of every layer as built
pub const BUILD_ROTATION_Y: f32 = FRAC_PI_3;

/// Offset the card label sits above its anchor
const CARD_LIFT: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub color: Rgb,
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: Rgb,
    pub emissive_intensity: f32,
}

impl StandardMaterial {
    /// Slightly metallic, self-lit in its own color
    pub fn layer(color: Rgb) -> Self {
        Self {
            color,
            metalness: 0.35,
            roughness: 0.5,
            emissive: color,
            emissive_intensity: 0.08,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub mesh: Mesh,
    pub material: StandardMaterial,
    pub transform: Transform,
    /// Height the layer settles at once the entrance animation is done
    pub rest_y: f32,
}

impl SceneMesh {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.matrix()
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub text: String,
    pub color: Rgb,
    pub font: FontSpec,
    pub style: LabelStyle,
    pub layout: SpriteLayout,
    pub position: Point3<f32>,
    pub opacity: f32,
}

impl Sprite {
    fn new(
        text: &str,
        color: Rgb,
        font: FontSpec,
        style: LabelStyle,
        position: Point3<f32>,
        measure: &dyn TextMeasure,
    ) -> Self {
        Self {
            text: text.to_string(),
            color,
            font,
            style,
            layout: SpriteLayout::measure(text, &font, &style, measure),
            position,
            opacity: 1.0,
        }
    }

    pub fn depth_test(&self) -> bool {
        self.style.depth_test()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    /// Light shines from here towards the origin
    pub position: Point3<f32>,
}

impl DirectionalLight {
    /// Unit vector from the lit surface towards the light
    pub fn direction(&self) -> Vector3<f32> {
        self.position.coords.normalize()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Rgb::WHITE,
                intensity: 0.55,
            },
            directional: DirectionalLight {
                color: Rgb::WHITE,
                intensity: 0.9,
                position: Point3::new(5.0, 10.0, 5.0),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Rgb,
    pub meshes: Vec<SceneMesh>,
    pub labels: Vec<Sprite>,
    pub lights: Lights,
}

/// Turn one descriptor into its mesh and label sprites.
pub fn build_layer(descriptor: &LayerDescriptor, measure: &dyn TextMeasure) -> (SceneMesh, Vec<Sprite>) {
    let y = descriptor.offset_y;
    let mesh = SceneMesh {
        mesh: Mesh::frustum(
            descriptor.top_radius,
            descriptor.bottom_radius,
            descriptor.height,
            RADIAL_SEGMENTS,
        ),
        material: StandardMaterial::layer(descriptor.color),
        transform: Transform::at(Point3::new(0.0, y, 0.0))
            .with_rotation(RotationState::about_y(BUILD_ROTATION_Y)),
        rest_y: y,
    };

    let sprite = |text: &str, position: Point3<f32>| {
        Sprite::new(
            text,
            descriptor.label_color,
            descriptor.font,
            LabelStyle::Plain,
            position,
            measure,
        )
    };

    let labels = match descriptor.placement {
        LabelPlacement::Below { gap } => descriptor
            .labels
            .iter()
            .take(1)
            .map(|text| sprite(text.as_str(), Point3::new(0.0, descriptor.bottom_y() - gap, 0.0)))
            .collect(),
        LabelPlacement::Above { gap } => descriptor
            .labels
            .iter()
            .take(1)
            .map(|text| sprite(text.as_str(), Point3::new(0.0, descriptor.top_y() + gap, 0.0)))
            .collect(),
        LabelPlacement::Faces => {
            // one label per prism face, unused faces stay empty
            let step = TAU / RADIAL_SEGMENTS as f32;
            let radius = (descriptor.top_radius + descriptor.bottom_radius) / 2.0;
            descriptor
                .labels
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let angle = i as f32 * step + FRAC_PI_3;
                    let (sin, cos) = angle.sin_cos();
                    sprite(text.as_str(), Point3::new(cos * radius, y, sin * radius))
                })
                .collect()
        }
    };

    (mesh, labels)
}

impl Scene {
    /// Validate and build every layer in order; labels keep layer order.
    pub fn build(
        theme: &Theme,
        layers: &[LayerDescriptor],
        measure: &dyn TextMeasure,
    ) -> Result<Self, LayerError> {
        let mut scene = Self {
            background: theme.background,
            meshes: Vec::with_capacity(layers.len()),
            labels: Vec::new(),
            lights: Lights::default(),
        };
        for (index, descriptor) in layers.iter().enumerate() {
            descriptor.validate(index)?;
            let (mesh, labels) = build_layer(descriptor, measure);
            scene.meshes.push(mesh);
            scene.labels.extend(labels);
        }
        log::debug!(
            "built scene: {} meshes, {} labels",
            scene.meshes.len(),
            scene.labels.len()
        );
        Ok(scene)
    }

    /// Add a card-style label hovering over `anchor_y`; returns its index.
    pub fn add_card_label(&mut self, anchor_y: f32, text: &str, measure: &dyn TextMeasure) -> usize {
        let font = FontSpec {
            size_px: 120.0,
            bold: false,
            family: CARD_FAMILY,
        };
        self.labels.push(Sprite::new(
            text,
            Rgb::WHITE,
            font,
            LabelStyle::card(),
            Point3::new(0.0, anchor_y + CARD_LIFT, 0.0),
            measure,
        ));
        self.labels.len() - 1
    }
}
