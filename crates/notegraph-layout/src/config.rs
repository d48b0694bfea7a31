//! Layout simulation configuration

use notegraph_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Force and cooling parameters for the layout simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Rest length of a link spring.
    pub link_distance: f64,

    /// Multiplier applied to every link's own strength.
    pub link_stiffness: f64,

    /// Pairwise repulsion; magnitude is `charge_strength * link_distance / d²`.
    pub charge_strength: f64,

    /// Pairs farther apart than this do not repel.
    pub charge_distance_max: f64,

    /// Per-node pull toward the center (keeps disconnected parts in view).
    pub gravity: f64,

    /// Fraction of the free-node centroid offset corrected each tick.
    pub center_strength: f64,

    /// Extra gap kept between node circles.
    pub collision_margin: f64,

    /// How much of an overlap is resolved per tick.
    pub collision_strength: f64,

    /// Fraction of velocity lost per tick (friction).
    pub velocity_decay: f64,

    /// Hard speed limit per tick.
    pub max_velocity: f64,

    pub alpha_decay: f64,

    /// Below this alpha the layout counts as settled and ticks are skipped.
    pub alpha_min: f64,

    /// Alpha target while a node is being dragged.
    pub drag_alpha_target: f64,

    /// Alpha applied when the node set changes under a warm-started layout.
    pub reheat_alpha: f64,

    pub center_x: f64,
    pub center_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            link_distance: 110.0,
            link_stiffness: 1.0,
            charge_strength: 350.0,
            charge_distance_max: 800.0,
            gravity: 0.02,
            center_strength: 0.1,
            collision_margin: 2.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            max_velocity: 40.0,
            // 300 ticks from 1.0 down to alpha_min
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
            alpha_min: 0.001,
            drag_alpha_target: 0.3,
            reheat_alpha: 0.5,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link_distance <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "linkDistance must be positive, got {}",
                self.link_distance
            )));
        }
        if self.charge_strength < 0.0 || self.gravity < 0.0 || self.link_stiffness < 0.0 {
            return Err(ConfigError::ValidationError(
                "chargeStrength, gravity and linkStiffness must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) || !(0.0..=1.0).contains(&self.center_strength) {
            return Err(ConfigError::ValidationError(
                "velocityDecay and centerStrength must be in [0, 1]".to_string(),
            ));
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "alphaDecay must be in (0, 1), got {}",
                self.alpha_decay
            )));
        }
        if self.max_velocity <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "maxVelocity must be positive, got {}",
                self.max_velocity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_link_distance() {
        let config = LayoutConfig {
            link_distance: 0.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
