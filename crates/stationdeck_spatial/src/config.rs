//! Tunables for every interaction component, loadable from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Result};

/// Camera/viewpoint soft boundary shared by every locomotion path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlayAreaConfig {
    /// Lowest allowed viewpoint height
    pub min_height: f32,
    /// Largest allowed horizontal distance from the origin
    pub max_radius: f32,
}

impl Default for PlayAreaConfig {
    fn default() -> Self {
        Self {
            min_height: 0.5,
            max_radius: 40.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DesktopConfig {
    /// Units per second with no modifier held
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    /// Fraction of velocity retained per 60 Hz frame
    pub smoothing: f32,
    /// Radians of rotation per pixel of pointer motion
    pub look_sensitivity: f32,
    /// Pitch is clamped to +/- this many degrees
    pub max_pitch_deg: f32,
    pub focus_duration: f32,
    /// Horizontal distance from the target where a focus animation ends
    pub focus_distance: f32,
    /// Height above the target where a focus animation ends
    pub focus_height: f32,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            sprint_multiplier: 2.5,
            smoothing: 0.85,
            look_sensitivity: 0.0025,
            max_pitch_deg: 85.0,
            focus_duration: 0.8,
            focus_distance: 6.0,
            focus_height: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DragConfig {
    pub snap_to_grid: bool,
    pub grid_size: f32,
    /// Radius of the circular floor boundary objects are kept inside
    pub boundary_radius: f32,
    pub stiffness: f32,
    /// Velocity multiplier applied every spring step
    pub damping: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            snap_to_grid: false,
            grid_size: 1.0,
            boundary_radius: 12.0,
            stiffness: 120.0,
            damping: 0.75,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub deadzone: f32,
    pub speed: f32,
    pub smoothing: f32,
    /// Grabs starting within this height of the floor are boundary clamped
    pub near_floor_threshold: f32,
    /// Height objects rest at on the floor
    pub floor_height: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.15,
            speed: 3.0,
            smoothing: 0.85,
            near_floor_threshold: 0.5,
            floor_height: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TeleportConfig {
    pub launch_speed: f32,
    pub gravity: f32,
    pub steps: usize,
    pub step_time: f32,
    /// Minimum vertical component of a landing surface normal
    pub min_up_normal: f32,
    /// Duration of each fade phase, in seconds
    pub fade_duration: f32,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        Self {
            launch_speed: 8.0,
            gravity: 9.8,
            steps: 30,
            step_time: 0.05,
            min_up_normal: 0.7,
            fade_duration: 0.15,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    /// Thumb/index distance that starts a pinch
    pub pinch_start: f32,
    /// Thumb/index distance that ends a pinch
    pub pinch_end: f32,
    /// Wrist to index length below which point-hover is ignored
    pub min_point_length: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_start: 0.025,
            pinch_end: 0.045,
            min_point_length: 0.08,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// A named circular region of the floor plan
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ZoneConfig {
    pub name: String,
    /// (x, z) centre on the floor plane
    pub center: [f32; 2],
    pub radius: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct InteractionConfig {
    pub play_area: PlayAreaConfig,
    pub desktop: DesktopConfig,
    pub drag: DragConfig,
    pub controller: ControllerConfig,
    pub teleport: TeleportConfig,
    pub gesture: GestureConfig,
    pub history: HistoryConfig,
    pub zones: Vec<ZoneConfig>,
}

impl InteractionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        info!("loaded interaction config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        fn positive(value: f32, name: &'static str) -> std::result::Result<(), ConfigError> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NotPositive(name))
            }
        }

        positive(self.play_area.max_radius, "play_area.max_radius")?;
        positive(self.desktop.base_speed, "desktop.base_speed")?;
        positive(self.desktop.sprint_multiplier, "desktop.sprint_multiplier")?;
        positive(self.desktop.focus_duration, "desktop.focus_duration")?;
        positive(self.drag.boundary_radius, "drag.boundary_radius")?;
        positive(self.drag.stiffness, "drag.stiffness")?;
        if self.drag.snap_to_grid {
            positive(self.drag.grid_size, "drag.grid_size")?;
        }
        positive(self.controller.speed, "controller.speed")?;
        positive(self.teleport.launch_speed, "teleport.launch_speed")?;
        positive(self.teleport.step_time, "teleport.step_time")?;
        positive(self.teleport.fade_duration, "teleport.fade_duration")?;
        if self.teleport.steps == 0 {
            return Err(ConfigError::NotPositive("teleport.steps"));
        }
        for zone in &self.zones {
            positive(zone.radius, "zone.radius")?;
        }

        for smoothing in [self.desktop.smoothing, self.controller.smoothing] {
            if !(0.0..1.0).contains(&smoothing) {
                return Err(ConfigError::Smoothing(smoothing));
            }
        }

        if !(0.0..=1.0).contains(&self.teleport.min_up_normal) {
            return Err(ConfigError::NormalThreshold(self.teleport.min_up_normal));
        }

        if self.gesture.pinch_end <= self.gesture.pinch_start {
            return Err(ConfigError::PinchThresholds {
                start: self.gesture.pinch_start,
                end: self.gesture.pinch_end,
            });
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(InteractionConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = InteractionConfig::from_json(r#"{ "drag": { "snap_to_grid": true } }"#)
            .expect("config");
        assert!(config.drag.snap_to_grid);
        assert_eq!(config.drag.boundary_radius, 12.0);
        assert_eq!(config.history, HistoryConfig::default());
    }

    #[test]
    fn rejects_inverted_pinch_thresholds() {
        let err = InteractionConfig::from_json(
            r#"{ "gesture": { "pinch_start": 0.05, "pinch_end": 0.02 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::PinchThresholds { .. })
        ));
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config = InteractionConfig::default();
        config.history.capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("interaction.json");

        let mut config = InteractionConfig::default();
        config.drag.grid_size = 2.0;
        config.zones.push(ZoneConfig {
            name: "ops".to_string(),
            center: [4.0, -3.0],
            radius: 5.0,
        });
        config.save(&path).expect("save");

        let loaded = InteractionConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
