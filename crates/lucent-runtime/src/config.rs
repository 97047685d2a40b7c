// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON configuration for an augmented-image session.

use crate::render_bridge::RenderSettings;
use lucent_core::{
    DisplayGeometry, ImageDatabase, ProviderError, ReferenceImage, SessionConfig, TextureHandle,
};
use lucent_telemetry::TelemetrySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read or written.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON was malformed or did not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The reference image database could not be built.
    #[error("image database: {0}")]
    Database(#[from] ProviderError),
    /// A value parsed but is out of range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Where reference images come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageDatabaseSource {
    /// No reference images.
    Empty,
    /// A database file produced by the provider's offline tooling.
    Serialized {
        /// Path to the database file.
        path: PathBuf,
    },
    /// Raw RGBA8 images, converted to grayscale at load time.
    RawRgba {
        /// One entry per image; index order is the database order.
        images: Vec<RawImageEntry>,
    },
}

/// A raw RGBA8 reference image on disk, rows tightly packed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawImageEntry {
    /// Name reported with detections.
    pub name: String,
    /// Path to the pixel data.
    pub path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Printed width in metres, if known.
    #[serde(default)]
    pub physical_width_m: Option<f32>,
}

/// Session section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Reference images to detect.
    pub image_database: ImageDatabaseSource,
    /// Texture name the camera image is streamed into.
    pub camera_texture: u32,
    /// Viewport geometry until the shell reports the real one.
    pub initial_geometry: DisplayGeometry,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            image_database: ImageDatabaseSource::Empty,
            camera_texture: 0,
            initial_geometry: DisplayGeometry::default(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LucentConfig {
    /// Session settings.
    pub session: SessionSettings,
    /// Projection and tint settings.
    pub render: RenderSettings,
    /// Logging and counter settings.
    pub telemetry: TelemetrySettings,
}

impl LucentConfig {
    /// Parses a configuration from a JSON string. Missing sections take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects render settings that cannot form a projection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render.validate().map_err(ConfigError::Invalid)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Writes the configuration as pretty JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the provider-facing session configuration.
    ///
    /// Relative image paths are resolved against `base_dir`.
    pub fn session_config(&self, base_dir: impl AsRef<Path>) -> Result<SessionConfig, ConfigError> {
        let base_dir = base_dir.as_ref();
        let image_database = match &self.session.image_database {
            ImageDatabaseSource::Empty => ImageDatabase::default(),
            ImageDatabaseSource::Serialized { path } => {
                let path = base_dir.join(path);
                let bytes = read(&path)?;
                log::info!("Loaded image database '{}' ({} bytes).", path.display(), bytes.len());
                ImageDatabase::Serialized(bytes)
            }
            ImageDatabaseSource::RawRgba { images } => {
                let mut loaded = Vec::with_capacity(images.len());
                for entry in images {
                    let path = base_dir.join(&entry.path);
                    let rgba = read(&path)?;
                    let mut image = ReferenceImage::from_rgba(
                        entry.name.clone(),
                        entry.width,
                        entry.height,
                        entry.width as usize * 4,
                        &rgba,
                    )?;
                    if let Some(width) = entry.physical_width_m {
                        image = image.with_physical_width(width);
                    }
                    loaded.push(image);
                }
                log::info!("Loaded {} reference images.", loaded.len());
                ImageDatabase::Images(loaded)
            }
        };

        Ok(SessionConfig {
            image_database,
            display_geometry: self.session.initial_geometry,
            camera_texture: TextureHandle(self.session.camera_texture),
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::math::ClipDepth;

    #[test]
    fn test_empty_json_is_default() {
        let config = LucentConfig::from_json("{}").expect("empty object is valid");
        assert_eq!(config, LucentConfig::default());
        assert_eq!(config.render.near, 0.1);
        assert_eq!(config.render.far, 100.0);
    }

    #[test]
    fn test_partial_sections() {
        let config = LucentConfig::from_json(
            r#"{
                "render": { "far": 50.0, "clip_depth": "ZeroToOne" },
                "session": { "camera_texture": 9, "image_database": { "kind": "empty" } }
            }"#,
        )
        .expect("valid config");
        assert_eq!(config.render.far, 50.0);
        assert_eq!(config.render.near, 0.1);
        assert_eq!(config.render.clip_depth, ClipDepth::ZeroToOne);
        assert_eq!(config.session.camera_texture, 9);
    }

    #[test]
    fn test_clip_planes_are_validated() {
        for json in [
            r#"{ "render": { "near": 0.0 } }"#,
            r#"{ "render": { "near": -0.5 } }"#,
            r#"{ "render": { "near": 5.0, "far": 1.0 } }"#,
        ] {
            let err = LucentConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}: {err}");
        }
    }

    #[test]
    fn test_unknown_database_kind_is_rejected() {
        let err = LucentConfig::from_json(r#"{ "session": { "image_database": { "kind": "png" } } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
