//! Tunables for a [`HammerWorld`](crate::world::HammerWorld).

use serde::{Deserialize, Serialize};

use crate::error::{HammerError, Result};

/// Standard gravity in world units per second squared.
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Configuration values for the physics world.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HammerConfig {
    /// Initial gravity magnitude. Pulls toward -Y.
    pub gravity: f32,
    /// Mass assigned to newly created bodies.
    pub default_mass: f32,
    /// Boxes closer than this still count as touching for contact events.
    pub contact_margin: f32,
    /// Distance below a sprite's feet that still counts as standing on a tile.
    pub ground_probe: f32,
    /// Inflation applied to a sprite's box before querying tilemap tiles.
    pub broad_phase_margin: f32,
    /// Cell size of the tile broad-phase grid.
    pub tile_cell_size: f32,
    /// Run the integration pass on the rayon pool when the `parallel`
    /// feature is enabled.
    pub parallel: bool,
}

impl Default for HammerConfig {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            default_mass: 0.3,
            contact_margin: 0.01,
            ground_probe: 0.001,
            broad_phase_margin: 0.5,
            tile_cell_size: 1.0,
            parallel: true,
        }
    }
}

impl HammerConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_default_mass(mut self, mass: f32) -> Self {
        self.default_mass = mass;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(invalid("gravity must be finite"));
        }
        if !(self.default_mass.is_finite() && self.default_mass > 0.0) {
            return Err(invalid("default_mass must be positive"));
        }
        for (name, value) in [
            ("contact_margin", self.contact_margin),
            ("ground_probe", self.ground_probe),
            ("broad_phase_margin", self.broad_phase_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(HammerError::InvalidArgument(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(self.tile_cell_size.is_finite() && self.tile_cell_size > 0.0) {
            return Err(invalid("tile_cell_size must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> HammerError {
    HammerError::InvalidArgument(msg.to_owned())
}
