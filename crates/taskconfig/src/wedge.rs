use serde::{Deserialize, Serialize};

use crate::{check_finite, check_positive, check_screen, Color, ConfigError, Profile};

/// Settings for the keyboard-driven wedge task.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WedgeConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub bg_color: Color,
    pub cue_color: Color,
    pub target_color: Color,
    /// Radius of the arc the wedge travels on, in screen heights.
    #[serde(alias = "target_radius")]
    pub task_radius: f64,
    pub wedge_height: f64,
    /// Angular size of the wedge, in degrees.
    pub wedge_size: f64,
    pub wedge_corner_rad: f64,
    pub target_height: f64,
    /// Angular size of each target zone beyond the wedge itself, in degrees.
    pub target_size: f64,
    pub target_corner_rad: f64,
    /// Target zone orientations in degrees; zero is straight up.
    pub target_pos: Vec<f64>,
    /// Wedge rotation speed while a key is held, in degrees per second.
    pub rotation_speed: f64,
}

impl Default for WedgeConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            bg_color: Color::grey(-1.0),
            cue_color: Color::grey(0.8),
            target_color: Color::new(-0.4, 0.4, -0.4),
            task_radius: 0.8,
            wedge_height: 0.06,
            wedge_size: 8.0,
            wedge_corner_rad: 0.01,
            target_height: 0.1,
            target_size: 4.0,
            target_corner_rad: 0.015,
            target_pos: vec![-30.0, 0.0, 30.0],
            rotation_speed: 60.0,
        }
    }
}

impl WedgeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        crate::parse(input)
    }
}

impl Profile for WedgeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_screen(self.screen_width, self.screen_height)?;
        self.bg_color.check("bg_color")?;
        self.cue_color.check("cue_color")?;
        self.target_color.check("target_color")?;

        check_positive("task_radius", self.task_radius)?;
        check_positive("wedge_height", self.wedge_height)?;
        check_positive("wedge_size", self.wedge_size)?;
        check_positive("target_height", self.target_height)?;
        check_finite("target_size", self.target_size)?;
        check_finite("rotation_speed", self.rotation_speed)?;

        for (key, radius, height) in [
            ("wedge_corner_rad", self.wedge_corner_rad, self.wedge_height),
            ("target_corner_rad", self.target_corner_rad, self.target_height),
        ] {
            if !(radius.is_finite() && radius >= 0.0 && 2.0 * radius < height) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be non-negative and less than half the shape height"
                )));
            }
        }

        for (index, angle) in self.target_pos.iter().enumerate() {
            if !angle.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "target_pos[{index}] must be finite"
                )));
            }
        }

        Ok(())
    }
}
