use serde::{Deserialize, Serialize};

use crate::{check_finite, check_positive, check_screen, Color, ConfigError, Hand, ModeCommand, Profile};

/// Settings for the rolling-marble task.
///
/// Every key is optional in the TOML document; anything left out falls back
/// to the demo profile values below.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarbleConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub bg_color: Color,
    pub cue_color: Color,
    pub trough_color: Color,
    pub trough_line_color: Color,
    pub trough_edge_color: Color,
    pub course_color: Color,
    pub marble_color: Color,
    pub marble_border_color: Color,
    pub marble_shadow_color: Color,
    /// Horizontal span of the trough mouth, in screen heights.
    pub trough_width: f64,
    pub trough_edge_width: f64,
    /// Full opening angle of the trough arc, in degrees.
    pub trough_full_angle: f64,
    /// Scroll speed in screen heights per second.
    pub trough_speed: f64,
    pub trough_count: usize,
    pub marble_base_ypos: f64,
    pub marble_rad: f64,
    pub rolling_bands: usize,
    pub kb_angle_gain: f64,
    pub marble_rota_coef: f64,
    /// Device angle (degrees) that corresponds to a level trough.
    pub neutral_angle: f64,
    pub display_hand: Hand,
    pub device_mode: ModeCommand,
    pub course: CourseSchedule,
}

impl Default for MarbleConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            bg_color: Color::grey(-1.0),
            cue_color: Color::grey(1.0),
            trough_color: Color::grey(0.2),
            trough_line_color: Color::grey(0.6),
            trough_edge_color: Color::grey(-0.2),
            course_color: Color::new(-0.4, 0.4, -0.4),
            marble_color: Color::new(0.6, -0.2, -0.2),
            marble_border_color: Color::new(0.2, -0.6, -0.6),
            marble_shadow_color: Color::grey(-0.8),
            trough_width: 0.5,
            trough_edge_width: 0.04,
            trough_full_angle: 60.0,
            trough_speed: 0.25,
            trough_count: 8,
            marble_base_ypos: -0.35,
            marble_rad: 0.04,
            rolling_bands: 1,
            kb_angle_gain: 1.0,
            marble_rota_coef: 0.1,
            neutral_angle: 0.0,
            display_hand: Hand::default(),
            device_mode: ModeCommand::default(),
            course: CourseSchedule::default(),
        }
    }
}

/// Sparse description of the example course shown in the trough.
///
/// `targets` are the lateral angles (degrees) the course visits, one every
/// `target_spacing` seconds, bracketed by level lead-in and lead-out segments
/// of `lead_spacing` seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourseSchedule {
    pub targets: Vec<f64>,
    pub target_spacing: f64,
    pub lead_spacing: f64,
    /// Sampling step along the scroll axis, in screen heights.
    pub step: f64,
    /// Angular width of the drawn course band, in degrees.
    pub angle_width: f64,
}

impl Default for CourseSchedule {
    fn default() -> Self {
        Self {
            targets: vec![25.0, -35.0, 15.0, -15.0, 30.0],
            target_spacing: 1.0,
            lead_spacing: 0.5,
            step: 0.01,
            angle_width: 15.0,
        }
    }
}

impl CourseSchedule {
    /// Expands the schedule into `(time, angle)` pairs.
    ///
    /// The course opens with two level points `lead_spacing` apart, visits each
    /// target every `target_spacing` seconds, then closes with two more level
    /// points one `target_spacing` and one further `lead_spacing` later.
    pub fn timed_targets(&self) -> Vec<(f64, f64)> {
        let lead = self.lead_spacing;
        let spacing = self.target_spacing;
        let mut points = Vec::with_capacity(self.targets.len() + 4);
        points.push((0.0, 0.0));
        points.push((lead, 0.0));
        for (index, angle) in self.targets.iter().enumerate() {
            points.push((lead + spacing * (index + 1) as f64, *angle));
        }
        let last_target = spacing * self.targets.len() as f64;
        points.push((last_target + spacing, 0.0));
        points.push((last_target + spacing + lead, 0.0));
        points
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_positive("course.target_spacing", self.target_spacing)?;
        check_positive("course.lead_spacing", self.lead_spacing)?;
        check_positive("course.step", self.step)?;
        check_positive("course.angle_width", self.angle_width)?;
        if self.lead_spacing >= self.target_spacing {
            return Err(ConfigError::Invalid(format!(
                "course.lead_spacing ({}) must be shorter than course.target_spacing ({})",
                self.lead_spacing, self.target_spacing
            )));
        }
        for angle in &self.targets {
            check_finite("course.targets", *angle)?;
        }
        Ok(())
    }
}

impl MarbleConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        crate::parse(input)
    }

    fn colours(&self) -> [(&'static str, &Color); 9] {
        [
            ("bg_color", &self.bg_color),
            ("cue_color", &self.cue_color),
            ("trough_color", &self.trough_color),
            ("trough_line_color", &self.trough_line_color),
            ("trough_edge_color", &self.trough_edge_color),
            ("course_color", &self.course_color),
            ("marble_color", &self.marble_color),
            ("marble_border_color", &self.marble_border_color),
            ("marble_shadow_color", &self.marble_shadow_color),
        ]
    }
}

impl Profile for MarbleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_screen(self.screen_width, self.screen_height)?;

        for (key, colour) in self.colours() {
            colour.check(key)?;
        }

        check_positive("trough_width", self.trough_width)?;
        check_positive("trough_speed", self.trough_speed)?;
        check_positive("marble_rad", self.marble_rad)?;
        check_finite("trough_edge_width", self.trough_edge_width)?;
        check_finite("marble_base_ypos", self.marble_base_ypos)?;
        check_finite("kb_angle_gain", self.kb_angle_gain)?;
        check_finite("marble_rota_coef", self.marble_rota_coef)?;
        check_finite("neutral_angle", self.neutral_angle)?;

        if !(self.trough_full_angle > 0.0 && self.trough_full_angle < 360.0) {
            return Err(ConfigError::Invalid(format!(
                "trough_full_angle must lie strictly between 0 and 360 degrees (got {})",
                self.trough_full_angle
            )));
        }

        if self.trough_count == 0 {
            return Err(ConfigError::Invalid(
                "trough_count must be at least 1".into(),
            ));
        }

        if self.rolling_bands == 0 {
            return Err(ConfigError::Invalid(
                "rolling_bands must be at least 1".into(),
            ));
        }

        if self.device_mode.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("device_mode may not be empty".into()));
        }

        self.course.validate()
    }
}
