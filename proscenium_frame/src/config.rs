// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration, read once at startup.

use std::path::Path;

use proscenium_metrics::{ContentConstraints, DEFAULT_OFFSET_TOLERANCE, MetricsProperties};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Content-area constraints and scaling options (`[content]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Smallest content width.
    pub min_width: i32,
    /// Largest content width.
    pub max_width: i32,
    /// Smallest content height.
    pub min_height: i32,
    /// Largest content height.
    pub max_height: i32,
    /// Combined letterboxing, in pixels, above which a larger scale factor is tried.
    #[serde(default = "default_offset_tolerance")]
    pub offset_tolerance: i32,
    /// Pixel space has its origin at the bottom-left.
    #[serde(default)]
    pub flip_vertical_axis: bool,
}

fn default_offset_tolerance() -> i32 {
    DEFAULT_OFFSET_TOLERANCE
}

impl ContentConfig {
    /// The constraints part.
    #[must_use]
    pub fn constraints(&self) -> ContentConstraints {
        ContentConstraints::new(self.min_width, self.min_height, self.max_width, self.max_height)
    }

    /// The metrics property flags.
    #[must_use]
    pub fn properties(&self) -> MetricsProperties {
        let mut p = MetricsProperties::empty();
        p.set(MetricsProperties::FLIP_VERTICAL_AXIS, self.flip_vertical_axis);
        p
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_width: 320,
            max_width: 480,
            min_height: 480,
            max_height: 854,
            offset_tolerance: DEFAULT_OFFSET_TOLERANCE,
            flip_vertical_axis: false,
        }
    }
}

/// Input dispatch options (`[dispatch]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Mask alpha a sample must exceed to count as a hit.
    #[serde(default)]
    pub alpha_threshold: u8,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `[content]` table.
    #[serde(default)]
    pub content: ContentConfig,
    /// `[dispatch]` table.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl EngineConfig {
    /// Parses a TOML document.
    ///
    /// Only the shape is checked here; the constraints are validated against the
    /// device when the [`FrameController`](crate::FrameController) is created.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serializes back to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let config = EngineConfig::from_toml_str(
            r#"
            [content]
            min_width = 320
            max_width = 480
            min_height = 480
            max_height = 854
            "#,
        )
        .unwrap();
        assert_eq!(config.content.offset_tolerance, DEFAULT_OFFSET_TOLERANCE);
        assert!(!config.content.flip_vertical_axis);
        assert_eq!(config.dispatch.alpha_threshold, 0);
        assert_eq!(
            config.content.constraints(),
            ContentConstraints::new(320, 480, 480, 854)
        );
    }

    #[test]
    fn all_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            [content]
            min_width = 100
            max_width = 200
            min_height = 300
            max_height = 400
            offset_tolerance = 0
            flip_vertical_axis = true

            [dispatch]
            alpha_threshold = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.content.offset_tolerance, 0);
        assert!(config.content.properties().contains(MetricsProperties::FLIP_VERTICAL_AXIS));
        assert_eq!(config.dispatch.alpha_threshold, 16);
    }

    #[test]
    fn missing_table_uses_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = EngineConfig::from_toml_str("[content]\nmin_width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
