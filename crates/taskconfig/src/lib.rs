use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod marble;
mod perspective;
mod wedge;

pub use marble::{CourseSchedule, MarbleConfig};
pub use perspective::{Quad, WarpProfile};
pub use wedge::WedgeConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {} not found", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Malformed(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A typed configuration document that can check its own values after parsing.
pub trait Profile: DeserializeOwned {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Parses and validates a profile from TOML text.
pub fn parse<T: Profile>(input: &str) -> Result<T, ConfigError> {
    let raw: T = toml::from_str(input)?;
    raw.validate()?;
    Ok(raw)
}

/// Reads, parses and validates a profile from disk.
pub fn load<T: Profile>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse(&contents)
}

/// RGB triple in the signed `[-1, 1]` colour space used by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Color(pub [f64; 3]);

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self([r, g, b])
    }

    pub const fn grey(level: f64) -> Self {
        Self([level, level, level])
    }

    fn check(&self, key: &str) -> Result<(), ConfigError> {
        if self
            .0
            .iter()
            .all(|channel| channel.is_finite() && (-1.0..=1.0).contains(channel))
        {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "{key} components must lie within [-1, 1]"
            )))
        }
    }
}

/// Which hand the task is displayed for. Fixes the device channel for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    #[default]
    #[serde(alias = "left")]
    Lh,
    #[serde(alias = "right")]
    Rh,
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Lh => f.write_str("lh"),
            Hand::Rh => f.write_str("rh"),
        }
    }
}

/// Opaque mode string forwarded to the hand-control device once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ModeCommand(pub String);

impl ModeCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModeCommand {
    fn default() -> Self {
        Self("mode_action_mirror_rh".to_string())
    }
}

fn check_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{key} must be a positive number (got {value})"
        )))
    }
}

fn check_finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{key} must be finite")))
    }
}

fn check_screen(width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(
            "screen_width and screen_height must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reports_path() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("absent.toml");
        let err = load::<MarbleConfig>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn loads_profile_from_disk() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("demo.toml");
        fs::write(&path, "trough_speed = 0.5\ndisplay_hand = \"rh\"\n").unwrap();
        let config: MarbleConfig = load(&path).unwrap();
        assert_eq!(config.trough_speed, 0.5);
        assert_eq!(config.display_hand, Hand::Rh);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = parse::<MarbleConfig>("trough_speed = [").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let err = parse::<MarbleConfig>("trough_sped = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
        assert!(err.to_string().contains("trough_sped"));

        let err = parse::<MarbleConfig>("[course]
target = [10.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
        assert!(parse::<WedgeConfig>("rotation_sped = 30.0").is_err());
        assert!(parse::<WarpProfile>("grid_wdith = 4").is_err());

        let wedge: WedgeConfig = parse("target_radius = 0.5").unwrap();
        assert_eq!(wedge.task_radius, 0.5);
    }

    #[test]
    fn colours_outside_range_are_invalid() {
        assert!(Color::new(0.0, 1.5, 0.0).check("bg_color").is_err());
        assert!(Color::grey(-1.0).check("bg_color").is_ok());
    }

    #[test]
    fn bundled_profiles_parse() {
        let marble: MarbleConfig = parse(include_str!("../../../config/demo.toml")).unwrap();
        assert_eq!(marble.course.targets.len(), 5);
        assert_eq!(marble.device_mode.as_str(), "mode_action_mirror_rh");

        let wedge: WedgeConfig = parse(include_str!("../../../config/wedge_demo.toml")).unwrap();
        assert_eq!(wedge.target_pos, vec![-30.0, 0.0, 30.0]);

        let stable: WarpProfile = parse(include_str!("../../../config/stable.toml")).unwrap();
        assert_eq!(stable.target, WarpProfile::default().target);
        let alt: WarpProfile = parse(include_str!("../../../config/alt.toml")).unwrap();
        assert_eq!(alt.source, WarpProfile::default().source);
        assert_ne!(alt.target, stable.target);
    }

    #[test]
    fn hand_accepts_long_names() {
        let config: MarbleConfig = parse("display_hand = \"right\"").unwrap();
        assert_eq!(config.display_hand, Hand::Rh);
    }
}
