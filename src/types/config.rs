//! Startup configuration
//!
//! The tracker is configured once, at startup, from a static list of known
//! objects plus two global knobs: whether objects begin life tracked, and
//! which depth-inference method to use. Configuration problems are never
//! fatal; malformed values degrade to safe defaults with a logged warning.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::attribute::{AttributeKey, Color, Shape};
use crate::errors::TrackerError;

/// Depth-inference method selection.
///
/// Only the monocular method is implemented. The selector exists so the
/// extension point is explicit in the configuration surface rather than
/// hidden in a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DepthMethod {
    /// Infer depth from apparent size versus known physical size.
    #[default]
    Monocular,
}

impl From<String> for DepthMethod {
    fn from(s: String) -> Self {
        DepthMethod::parse(&s)
    }
}

impl From<DepthMethod> for String {
    fn from(m: DepthMethod) -> Self {
        match m {
            DepthMethod::Monocular => "monocular".to_string(),
        }
    }
}

impl DepthMethod {
    /// Resolve a configured method name, downgrading unknown names to
    /// monocular with a warning.
    pub fn parse(s: &str) -> Self {
        match s {
            "monocular" => DepthMethod::Monocular,
            other => {
                log::warn!(
                    "Got depth method [{}], but only monocular method is supported. Switching...",
                    other
                );
                DepthMethod::Monocular
            }
        }
    }
}

/// One known object: a human-readable name, its attribute categories, and
/// its physical size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Human-readable object name; also the handle reconfiguration calls use
    pub name: String,
    /// Shape category
    pub shape: Shape,
    /// Color category
    pub color: Color,
    /// Known physical radius, meters
    pub ideal_radius: f64,
}

impl ObjectConfig {
    /// Create an object definition.
    pub fn new(
        name: impl Into<String>,
        shape: impl Into<Shape>,
        color: impl Into<Color>,
        ideal_radius: f64,
    ) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            color: color.into(),
            ideal_radius,
        }
    }

    /// The attribute key this object is tracked under.
    pub fn attribute_key(&self) -> AttributeKey {
        AttributeKey::new(self.shape.clone(), self.color.clone())
    }
}

/// Complete startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Known objects, in registration order
    pub objects: Vec<ObjectConfig>,
    /// Whether objects start in the tracked state
    #[serde(default)]
    pub immediate_tracking: bool,
    /// Depth-inference method
    #[serde(default)]
    pub depth_method: DepthMethod,
}

impl TrackerConfig {
    /// Create a configuration with the given objects and defaults for the
    /// global knobs (`immediate_tracking = false`, monocular depth).
    pub fn new(objects: Vec<ObjectConfig>) -> Self {
        Self {
            objects,
            immediate_tracking: false,
            depth_method: DepthMethod::default(),
        }
    }

    /// Enable immediate tracking.
    pub fn with_immediate_tracking(mut self, immediate: bool) -> Self {
        self.immediate_tracking = immediate;
        self
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TrackerError::Configuration {
            description: format!("failed to read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| TrackerError::Configuration {
            description: format!("failed to parse {}: {}", path.display(), e),
        })
    }
}
