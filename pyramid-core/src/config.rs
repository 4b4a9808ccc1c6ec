/// Viewer configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::entrance::ENTRANCE_EASE;
use crate::orbit::OrbitSettings;
use crate::tween::Ease;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Optional overrides for the orbit controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitOverrides {
    pub damping_factor: Option<f32>,
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Id of the element the canvas is appended to
    pub container: String,
    /// Upper bound on device pixels per CSS pixel
    pub max_pixel_ratio: f64,
    /// Play the entrance animation on start
    pub animate: bool,
    /// Ease curve name for the entrance, e.g. `"power2.out"` or `"none"`
    pub ease: String,
    /// Theme values keyed by custom property name, e.g. `"--accent"`
    pub theme: BTreeMap<String, String>,
    pub orbit: OrbitOverrides,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            container: "container".to_string(),
            max_pixel_ratio: 2.0,
            animate: true,
            ease: "power2.out".to_string(),
            theme: BTreeMap::new(),
            orbit: OrbitOverrides::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Look up a theme override; feed this to [`crate::Theme::resolve`].
    pub fn theme_value(&self, property: &str) -> Option<String> {
        self.theme.get(property).cloned()
    }

    /// The configured entrance ease; unknown names fall back to the default.
    pub fn entrance_ease(&self) -> Ease {
        Ease::parse(&self.ease).unwrap_or_else(|err| {
            log::warn!("{err}, using the default entrance ease");
            ENTRANCE_EASE
        })
    }

    pub fn orbit_settings(&self) -> OrbitSettings {
        let mut settings = OrbitSettings::default();
        if let Some(factor) = self.orbit.damping_factor {
            settings.damping_factor = factor.clamp(0.0, 1.0);
            settings.enable_damping = factor > 0.0;
        }
        if let Some(min) = self.orbit.min_distance {
            settings.min_distance = min.max(0.0);
        }
        if let Some(max) = self.orbit.max_distance {
            settings.max_distance = max;
        }
        // a lone min override may pass the default max
        settings.max_distance = settings.max_distance.max(settings.min_distance);
        settings
    }

    /// `min(max_pixel_ratio, device_ratio)`, treating a bad device ratio as 1
    pub fn pixel_ratio(&self, device_ratio: f64) -> f64 {
        let device = if device_ratio.is_finite() && device_ratio > 0.0 {
            device_ratio
        } else {
            1.0
        };
        device.min(self.max_pixel_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Rgb, Theme, PROP_ACCENT};

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(ViewerConfig::from_toml_str("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ViewerConfig::from_toml_str(
            r##"
            container = "pyramid"
            animate = false

            [theme]
            "--accent" = "#ff0000"

            [orbit]
            min_distance = 4.0
            max_distance = 2.0
            "##,
        )
        .unwrap();
        assert_eq!(config.container, "pyramid");
        assert!(!config.animate);

        let theme = Theme::resolve(|name| config.theme_value(name));
        assert_eq!(theme.accent, Rgb::new(0xff, 0, 0));
        assert_eq!(config.theme_value(PROP_ACCENT).as_deref(), Some("#ff0000"));

        let orbit = config.orbit_settings();
        assert_eq!(orbit.min_distance, 4.0);
        assert_eq!(orbit.max_distance, 4.0);
    }

    #[test]
    fn test_lone_min_distance_lifts_max() {
        let config = ViewerConfig::from_toml_str("[orbit]\nmin_distance = 60.0\n").unwrap();
        let orbit = config.orbit_settings();
        assert_eq!(orbit.min_distance, 60.0);
        assert_eq!(orbit.max_distance, 60.0);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("pyramid-config-{}.toml", std::process::id()));
        std::fs::write(&path, "container = \"stage\"\nmax_pixel_ratio = 1.0\n").unwrap();
        let loaded = ViewerConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.container, "stage");
        assert_eq!(config.max_pixel_ratio, 1.0);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("pyramid-config-does-not-exist.toml");
        assert!(matches!(ViewerConfig::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_entrance_ease() {
        assert_eq!(ViewerConfig::default().entrance_ease(), ENTRANCE_EASE);
        let config = ViewerConfig::from_toml_str("ease = \"quad.inOut\"").unwrap();
        assert_eq!(config.entrance_ease(), Ease::PowerInOut(1));
        let config = ViewerConfig::from_toml_str("ease = \"bounce\"").unwrap();
        assert_eq!(config.entrance_ease(), ENTRANCE_EASE);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            ViewerConfig::from_toml_str("animate = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_pixel_ratio() {
        let config = ViewerConfig::default();
        assert_eq!(config.pixel_ratio(3.0), 2.0);
        assert_eq!(config.pixel_ratio(1.5), 1.5);
        assert_eq!(config.pixel_ratio(0.0), 1.0);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = ViewerConfig::default();
        config.theme.insert("--bg".to_string(), "#000".to_string());
        let text = config.to_toml_string().unwrap();
        assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), config);
    }
}
