//! Graph construction and analytics tunables

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Heuristics used by the graph builder and the clustering pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    /// Strength of a `[[Target]]` cross-reference link.
    pub reference_strength: f64,

    /// Strength of a child → parent folder link.
    pub hierarchy_strength: f64,

    /// Whether shared tags produce links at all.
    pub link_shared_tags: bool,

    /// Shared-tag links are created only when the Jaccard similarity is
    /// strictly greater than this.
    pub tag_similarity_threshold: f64,

    /// Smallest dominant-tag group accepted as a cluster.
    pub min_cluster_size: usize,

    /// Cluster size at which coherence saturates at 1.0.
    pub coherence_scale: f64,

    /// Node radius for a node with no connections.
    pub base_node_size: f64,

    /// Radius growth per sqrt(connection).
    pub node_size_scale: f64,

    pub max_node_size: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reference_strength: 0.8,
            hierarchy_strength: 0.5,
            link_shared_tags: true,
            tag_similarity_threshold: 0.2,
            min_cluster_size: 3,
            coherence_scale: 10.0,
            base_node_size: 4.0,
            node_size_scale: 2.0,
            max_node_size: 24.0,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("referenceStrength", self.reference_strength),
            ("hierarchyStrength", self.hierarchy_strength),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.tag_similarity_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "tagSimilarityThreshold must be in [0, 1), got {}",
                self.tag_similarity_threshold
            )));
        }
        if self.min_cluster_size == 0 {
            return Err(ConfigError::ValidationError(
                "minClusterSize must be at least 1".to_string(),
            ));
        }
        if self.coherence_scale <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "coherenceScale must be positive, got {}",
                self.coherence_scale
            )));
        }
        if self.base_node_size <= 0.0 || self.max_node_size < self.base_node_size {
            return Err(ConfigError::ValidationError(format!(
                "node sizes must satisfy 0 < baseNodeSize <= maxNodeSize, got {} and {}",
                self.base_node_size, self.max_node_size
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
        assert!(GraphConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_threshold_of_one() {
        let config = GraphConfig {
            tag_similarity_threshold: 1.0,
            ..GraphConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_zero_cluster_size() {
        let config = GraphConfig {
            min_cluster_size: 0,
            ..GraphConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
