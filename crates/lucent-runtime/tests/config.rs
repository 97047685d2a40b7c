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

use anyhow::Result;
use lucent_core::math::ClipDepth;
use lucent_core::{DisplayRotation, ImageDatabase};
use lucent_infra::ScriptedProvider;
use lucent_runtime::{
    AugmentedImageApp, ConfigError, ImageDatabaseSource, LucentConfig, RawImageEntry,
};
use std::sync::Arc;

#[test]
fn test_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("lucent.json");

    let mut config = LucentConfig::default();
    config.render.clip_depth = ClipDepth::ZeroToOne;
    config.render.far = 20.0;
    config.session.camera_texture = 7;
    config.session.initial_geometry.rotation = DisplayRotation::Rotation270;
    config.telemetry.summary_interval_ticks = 120;
    config.session.image_database = ImageDatabaseSource::Serialized {
        path: "images.imgdb".into(),
    };
    config.to_file(&path)?;

    assert_eq!(LucentConfig::from_file(&path)?, config);
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let err = LucentConfig::from_file("/nonexistent/lucent.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_serialized_database_is_loaded_relative_to_base_dir() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("images.imgdb"), [1u8, 2, 3, 4])?;

    let mut config = LucentConfig::default();
    config.session.image_database = ImageDatabaseSource::Serialized {
        path: "images.imgdb".into(),
    };
    let session = config.session_config(dir.path())?;
    assert_eq!(session.image_database, ImageDatabase::Serialized(vec![1, 2, 3, 4]));
    Ok(())
}

#[test]
fn test_raw_images_are_converted_to_grayscale() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // 2x1: white, black.
    std::fs::write(
        dir.path().join("marker.rgba"),
        [255u8, 255, 255, 255, 0, 0, 0, 255],
    )?;

    let mut config = LucentConfig::default();
    config.session.image_database = ImageDatabaseSource::RawRgba {
        images: vec![RawImageEntry {
            name: "marker".to_string(),
            path: "marker.rgba".into(),
            width: 2,
            height: 1,
            physical_width_m: Some(0.15),
        }],
    };
    let session = config.session_config(dir.path())?;
    let ImageDatabase::Images(images) = &session.image_database else {
        anyhow::bail!("expected a reference image list");
    };
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].name, "marker");
    assert_eq!(images[0].pixels.len(), 2);
    assert!(images[0].pixels[0] >= 254);
    assert_eq!(images[0].pixels[1], 0);
    assert_eq!(images[0].physical_width_m, Some(0.15));
    Ok(())
}

#[test]
fn test_truncated_raw_image_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("short.rgba"), [0u8; 4])?;

    let mut config = LucentConfig::default();
    config.session.image_database = ImageDatabaseSource::RawRgba {
        images: vec![RawImageEntry {
            name: "short".to_string(),
            path: "short.rgba".into(),
            width: 4,
            height: 4,
            physical_width_m: None,
        }],
    };
    let err = config.session_config(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Database(_)));
    Ok(())
}

#[test]
fn test_app_from_config_forwards_session_settings() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = LucentConfig::from_json(
        r#"{ "session": { "camera_texture": 11, "initial_geometry": { "rotation": "Rotation90", "width": 720, "height": 1280 } } }"#,
    )?;
    let provider = ScriptedProvider::new();
    let script = provider.handle();
    let mut app = AugmentedImageApp::from_config(Arc::new(provider), &config, dir.path())?;
    app.on_resume()?;
    app.on_draw_frame()?;

    let stats = script.stats();
    assert_eq!(stats.configured_images, Some(0));
    assert_eq!(stats.applied_geometries[0].rotation, DisplayRotation::Rotation90);
    assert_eq!(stats.camera_texture.map(|t| t.0), Some(11));
    Ok(())
}

#[test]
fn test_from_config_rejects_degenerate_clip_planes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = LucentConfig::default();
    config.render.near = 2.0;
    config.render.far = 0.5;

    let provider = ScriptedProvider::new();
    let script = provider.handle();
    let err = AugmentedImageApp::from_config(Arc::new(provider), &config, dir.path())
        .err()
        .expect("degenerate planes are rejected");
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert_eq!(script.stats().sessions_created, 0);
    Ok(())
}

#[test]
fn test_zero_near_plane_in_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("lucent.json");
    std::fs::write(&path, r#"{ "render": { "near": 0.0 } }"#)?;

    let err = LucentConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("near plane"));
    Ok(())
}
