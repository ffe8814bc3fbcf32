//! Editor configuration resource.
//!
//! Interaction tuning loaded from an INI file. Every value has a safe default
//! so the editor works without a file.
//!
//! # Configuration File Format
//!
//! ```ini
//! [handles]
//! rotation_band = 1.25
//! rotation_step_degrees = 5
//! nudge_step = 1
//! anchor_hit_size = 8
//! pivot_hit_radius = 6
//!
//! [camera]
//! fit_padding = 32
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::error::SceneError;

/// Default safe values for startup
const DEFAULT_ROTATION_BAND: f64 = 1.25;
const DEFAULT_ROTATION_STEP_DEGREES: f64 = 5.0;
const DEFAULT_NUDGE_STEP: f64 = 1.0;
const DEFAULT_ANCHOR_HIT_SIZE: f64 = 8.0;
const DEFAULT_PIVOT_HIT_RADIUS: f64 = 6.0;
const DEFAULT_FIT_PADDING: f64 = 32.0;
const DEFAULT_CONFIG_PATH: &str = "./sceneforge.ini";

/// Editor configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Outer polygon of the rotation band, as a factor of the hit area.
    pub rotation_band: f64,
    /// Rotation applied per Alt+arrow key press, in degrees.
    pub rotation_step_degrees: f64,
    /// Units moved per arrow key press for resize and pivot nudges.
    pub nudge_step: f64,
    /// Side of the square grab area around each resize anchor, in world units.
    pub anchor_hit_size: f64,
    /// Grab radius around the pivot, in world units.
    pub pivot_hit_radius: f64,
    /// Margin kept around content when fitting the view.
    pub fit_padding: f64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            rotation_band: DEFAULT_ROTATION_BAND,
            rotation_step_degrees: DEFAULT_ROTATION_STEP_DEGREES,
            nudge_step: DEFAULT_NUDGE_STEP,
            anchor_hit_size: DEFAULT_ANCHOR_HIT_SIZE,
            pivot_hit_radius: DEFAULT_PIVOT_HIT_RADIUS,
            fit_padding: DEFAULT_FIT_PADDING,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    pub fn load_from_file(&mut self) -> Result<(), SceneError> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| SceneError::Config(format!("Failed to load config file: {}", e)))?;
        self.read_ini(&config);
        info!("Loaded config from {:?}: {:?}", self.config_path, self);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), SceneError> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| SceneError::Config(format!("Failed to parse config: {}", e)))?;
        self.read_ini(&config);
        Ok(())
    }

    fn read_ini(&mut self, config: &Ini) {
        // [handles] section
        read_float(config, "handles", "rotation_band", &mut self.rotation_band);
        read_float(
            config,
            "handles",
            "rotation_step_degrees",
            &mut self.rotation_step_degrees,
        );
        read_float(config, "handles", "nudge_step", &mut self.nudge_step);
        read_float(config, "handles", "anchor_hit_size", &mut self.anchor_hit_size);
        read_float(config, "handles", "pivot_hit_radius", &mut self.pivot_hit_radius);

        // [camera] section
        read_float(config, "camera", "fit_padding", &mut self.fit_padding);
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), SceneError> {
        let mut config = Ini::new();

        // [handles] section
        config.set("handles", "rotation_band", Some(self.rotation_band.to_string()));
        config.set(
            "handles",
            "rotation_step_degrees",
            Some(self.rotation_step_degrees.to_string()),
        );
        config.set("handles", "nudge_step", Some(self.nudge_step.to_string()));
        config.set("handles", "anchor_hit_size", Some(self.anchor_hit_size.to_string()));
        config.set("handles", "pivot_hit_radius", Some(self.pivot_hit_radius.to_string()));

        // [camera] section
        config.set("camera", "fit_padding", Some(self.fit_padding.to_string()));

        config.write(&self.config_path)?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

fn read_float(config: &Ini, section: &str, key: &str, target: &mut f64) {
    match config.getfloat(section, key) {
        Ok(Some(value)) if value.is_finite() => *target = value,
        Ok(Some(_)) | Err(_) => warn!("Ignoring invalid config value [{}] {}", section, key),
        Ok(None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_safe() {
        let c = EditorConfig::new();
        assert_eq!(c.rotation_band, 1.25);
        assert_eq!(c.nudge_step, 1.0);
        assert_eq!(c.fit_padding, 32.0);
    }

    #[test]
    fn partial_ini_overrides_only_given_keys() {
        let mut c = EditorConfig::new();
        c.load_from_str("[handles]\nnudge_step = 10\nrotation_band = oops\n")
            .unwrap();
        assert_eq!(c.nudge_step, 10.0);
        assert_eq!(c.rotation_band, 1.25);
        assert_eq!(c.pivot_hit_radius, 6.0);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("sceneforge-{}.ini", std::process::id()));
        let mut saved = EditorConfig::with_path(&path);
        saved.rotation_step_degrees = 15.0;
        saved.fit_padding = 4.0;
        saved.save_to_file().unwrap();

        let mut loaded = EditorConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, saved);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let mut c = EditorConfig::with_path("/nonexistent/sceneforge.ini");
        assert!(matches!(c.load_from_file(), Err(SceneError::Config(_))));
    }
}
