use serde::{Deserialize, Serialize};

use crate::{ConfigError, Profile};

const SCREEN_ASPECT: f64 = 16.0 / 9.0;

/// Four corners listed in a consistent winding order.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Quad(pub [[f64; 2]; 4]);

impl Quad {
    pub fn corners(&self) -> [(f64, f64); 4] {
        self.0.map(|[x, y]| (x, y))
    }
}

/// Geometry used to precompute the perspective correction grid.
///
/// `source` describes the idealised flat display and `target` where each of
/// its corners actually lands on the projection surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarpProfile {
    pub source: Quad,
    pub target: Quad,
    pub grid_width: usize,
    pub grid_height: usize,
}

impl Default for WarpProfile {
    fn default() -> Self {
        Self {
            source: Quad([
                [-SCREEN_ASPECT, -1.0],
                [-SCREEN_ASPECT, 1.0],
                [SCREEN_ASPECT, 1.0],
                [SCREEN_ASPECT, -1.0],
            ]),
            target: Quad([[-0.25, 0.0], [-0.75, 1.0], [1.75, 1.0], [1.25, 0.0]]),
            grid_width: 100,
            grid_height: 60,
        }
    }
}

impl WarpProfile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        crate::parse(input)
    }
}

impl Profile for WarpProfile {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::Invalid(
                "grid_width and grid_height must be greater than zero".into(),
            ));
        }

        let finite = |quad: &Quad| quad.0.iter().flatten().all(|value| value.is_finite());
        if !finite(&self.source) || !finite(&self.target) {
            return Err(ConfigError::Invalid(
                "warp quad corners must be finite".into(),
            ));
        }

        Ok(())
    }
}
