/// Layer descriptors: the table the pyramid is built from
use thiserror::Error;

use crate::label::FontSpec;
use crate::theme::{Rgb, Theme};

/// Text color for labels painted on the light middle layer
pub const LABEL_DARK: Rgb = Rgb::from_hex_int(0x0f2940);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayerError {
    #[error("layer {index}: {field} must be finite")]
    NotFinite { index: usize, field: &'static str },
    #[error("layer {index}: radii must be non-negative and not both zero")]
    BadRadius { index: usize },
    #[error("layer {index}: height must be positive")]
    BadHeight { index: usize },
    #[error("layer {index}: expected 1 to 3 labels, got {count}")]
    LabelCount { index: usize, count: usize },
}

/// Where a layer's labels go relative to its mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelPlacement {
    /// One label centered under the layer, `gap` below its bottom face
    Below { gap: f32 },
    /// One label centered over the layer, `gap` above its top face
    Above { gap: f32 },
    /// One label per side face, at mid height on the mean radius
    Faces,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub labels: Vec<String>,
    pub color: Rgb,
    pub top_radius: f32,
    pub bottom_radius: f32,
    pub height: f32,
    pub offset_y: f32,
    pub placement: LabelPlacement,
    pub label_color: Rgb,
    pub font: FontSpec,
}

impl LayerDescriptor {
    pub fn validate(&self, index: usize) -> Result<(), LayerError> {
        let numbers = [
            ("top_radius", self.top_radius),
            ("bottom_radius", self.bottom_radius),
            ("height", self.height),
            ("offset_y", self.offset_y),
        ];
        if let Some(&(field, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LayerError::NotFinite { index, field });
        }
        if self.top_radius < 0.0
            || self.bottom_radius < 0.0
            || (self.top_radius == 0.0 && self.bottom_radius == 0.0)
        {
            return Err(LayerError::BadRadius { index });
        }
        if self.height <= 0.0 {
            return Err(LayerError::BadHeight { index });
        }

        let count = self.labels.len();
        let allowed = match self.placement {
            LabelPlacement::Faces => (1..=3).contains(&count),
            LabelPlacement::Below { .. } | LabelPlacement::Above { .. } => count == 1,
        };
        if !allowed {
            return Err(LayerError::LabelCount { index, count });
        }
        Ok(())
    }

    /// Y coordinate of the top face when resting
    pub fn top_y(&self) -> f32 {
        self.offset_y + self.height / 2.0
    }

    pub fn bottom_y(&self) -> f32 {
        self.offset_y - self.height / 2.0
    }
}

/// Bottom to top: partner base, local capabilities, client apex.
pub fn default_layers(theme: &Theme) -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor {
            labels: vec!["Local Partner: PICO".to_string()],
            color: theme.base,
            top_radius: 2.3,
            bottom_radius: 3.5,
            height: 1.7,
            offset_y: -1.0,
            placement: LabelPlacement::Below { gap: 0.8 },
            label_color: Rgb::WHITE,
            font: FontSpec::bold(50.0),
        },
        LayerDescriptor {
            labels: vec![
                "Local Manufacturing".to_string(),
                "Local Service".to_string(),
                "Local Application Development".to_string(),
            ],
            color: theme.muted,
            top_radius: 1.3,
            bottom_radius: 2.1,
            height: 1.5,
            offset_y: 0.8,
            placement: LabelPlacement::Faces,
            label_color: LABEL_DARK,
            font: FontSpec::bold(32.0),
        },
        LayerDescriptor {
            labels: vec!["Local Clients: You".to_string()],
            color: theme.accent,
            top_radius: 0.0,
            bottom_radius: 1.1,
            height: 1.7,
            offset_y: 2.6,
            placement: LabelPlacement::Above { gap: 0.3 },
            label_color: Rgb::WHITE,
            font: FontSpec::bold(50.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let layers = default_layers(&Theme::default());
        assert_eq!(layers.len(), 3);
        for (index, layer) in layers.iter().enumerate() {
            layer.validate(index).unwrap();
        }
        let labels: usize = layers.iter().map(|l| l.labels.len()).sum();
        assert_eq!(labels, 5);
    }

    #[test]
    fn test_layers_take_theme_colors() {
        let theme = Theme::default();
        let layers = default_layers(&theme);
        assert_eq!(layers[0].color, theme.base);
        assert_eq!(layers[1].color, theme.muted);
        assert_eq!(layers[2].color, theme.accent);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut layer = default_layers(&Theme::default()).remove(2);
        layer.bottom_radius = 0.0;
        assert_eq!(layer.validate(2), Err(LayerError::BadRadius { index: 2 }));

        layer.bottom_radius = 1.0;
        layer.height = f32::NAN;
        assert_eq!(
            layer.validate(2),
            Err(LayerError::NotFinite { index: 2, field: "height" })
        );

        layer.height = 0.0;
        assert_eq!(layer.validate(2), Err(LayerError::BadHeight { index: 2 }));
    }

    #[test]
    fn test_validate_label_counts() {
        let mut layer = default_layers(&Theme::default()).remove(0);
        layer.labels.push("extra".to_string());
        assert_eq!(
            layer.validate(0),
            Err(LayerError::LabelCount { index: 0, count: 2 })
        );

        layer.placement = LabelPlacement::Faces;
        assert!(layer.validate(0).is_ok());
    }
}
