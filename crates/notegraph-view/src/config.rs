//! Engine configuration: graph, layout and view sections loaded from TOML

use std::path::{Path, PathBuf};

use notegraph_core::{ConfigError, GraphConfig};
use notegraph_layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "notegraph.toml";

/// Presentation and interaction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Hop count used by `focus` when no depth is given.
    pub focus_depth: usize,
    pub show_labels: bool,
    pub show_orphans: bool,

    /// Quiet period before a filter change is applied on large graphs.
    pub debounce_ms: u64,

    /// Node count from which filter changes are debounced.
    pub debounce_threshold: usize,

    /// Opacity of nodes and links outside the hovered neighborhood.
    pub dimmed_opacity: f64,

    /// Pointer travel (layout units) beyond which a press becomes a drag.
    pub drag_threshold: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            focus_depth: 2,
            show_labels: true,
            show_orphans: true,
            debounce_ms: 200,
            debounce_threshold: 1000,
            dimmed_opacity: 0.15,
            drag_threshold: 3.0,
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.dimmed_opacity) {
            return Err(ConfigError::ValidationError(format!(
                "dimmedOpacity must be in [0, 1], got {}",
                self.dimmed_opacity
            )));
        }
        if self.drag_threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "dragThreshold must not be negative, got {}",
                self.drag_threshold
            )));
        }
        Ok(())
    }
}

/// Complete engine configuration.
///
/// ```toml
/// [graph]
/// tagSimilarityThreshold = 0.25
///
/// [layout]
/// linkDistance = 90.0
///
/// [view]
/// focusDepth = 1
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub layout: LayoutConfig,
    pub view: ViewConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("Invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {e}", path.display())))?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    /// Load from an explicit path, or from `notegraph.toml` in `dir` if it
    /// exists, or fall back to defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graph.validate()?;
        self.layout.validate()?;
        self.view.validate()
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
