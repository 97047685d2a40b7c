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

//! Contracts implemented by a tracking service backend.
//!
//! The runtime only ever talks to the service through these traits. A backend
//! wraps a vendor SDK; `lucent-infra` ships a scripted in-memory one.
//!
//! Ownership follows the service's model: the [`TrackingProvider`] is a factory,
//! the [`ArSession`] it creates is owned by the lifecycle controller, and anchors
//! are created and released through the session's [`AnchorFactory`] side.

use crate::error::ProviderError;
use crate::frame::{Frame, TextureHandle};
use crate::geometry::DisplayGeometry;
use crate::pose::Pose;
use crate::tracking::TrackableId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of asking the provider whether tracking can run on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// Installed and supported; a session can be created.
    Supported,
    /// The provider started an install or update flow. Try again after it completes.
    InstallRequested,
    /// The device cannot run tracking.
    Unsupported,
}

/// A reference image to detect, in 8-bit grayscale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// Name reported back with each detection.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major luminance, `width * height` bytes.
    pub pixels: Vec<u8>,
    /// Printed width in metres, when known. Speeds up initial detection.
    pub physical_width_m: Option<f32>,
}

impl ReferenceImage {
    /// Converts an RGBA8 image with the given row stride (in bytes) to grayscale.
    ///
    /// Luminance is `0.213 R + 0.715 G + 0.072 B`, truncated; alpha is ignored.
    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        stride: usize,
        rgba: &[u8],
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Err(ProviderError::InvalidDatabase(format!(
                "image '{name}' has no pixels"
            )));
        }
        if stride < w * 4 || rgba.len() < stride * (h - 1) + w * 4 {
            return Err(ProviderError::InvalidDatabase(format!(
                "image '{name}': {} bytes is too small for {width}x{height} with stride {stride}",
                rgba.len()
            )));
        }

        let mut pixels = Vec::with_capacity(w * h);
        for row in rgba.chunks(stride).take(h) {
            pixels.extend(row[..w * 4].chunks_exact(4).map(|px| {
                (0.213 * px[0] as f32 + 0.715 * px[1] as f32 + 0.072 * px[2] as f32) as u8
            }));
        }

        Ok(Self {
            name,
            width,
            height,
            pixels,
            physical_width_m: None,
        })
    }

    /// Sets the known physical width.
    pub fn with_physical_width(mut self, metres: f32) -> Self {
        self.physical_width_m = Some(metres);
        self
    }
}

/// Source of the reference images a session detects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageDatabase {
    /// A database built ahead of time by the provider's tooling.
    Serialized(Vec<u8>),
    /// Images added one by one at session creation. Index order is preserved.
    Images(Vec<ReferenceImage>),
}

impl ImageDatabase {
    /// Number of images when known without deserializing.
    pub fn image_count(&self) -> Option<usize> {
        match self {
            Self::Serialized(_) => None,
            Self::Images(images) => Some(images.len()),
        }
    }
}

impl Default for ImageDatabase {
    fn default() -> Self {
        Self::Images(Vec::new())
    }
}

/// Everything a provider needs to create and configure a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Images to detect.
    pub image_database: ImageDatabase,
    /// Display geometry to apply before the first update.
    pub display_geometry: DisplayGeometry,
    /// Texture the camera image is streamed into.
    pub camera_texture: TextureHandle,
}

/// Provider-side handle to a live anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorHandle(pub u64);

impl fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor-{}", self.0)
    }
}

/// Creates and releases world-fixed anchors.
pub trait AnchorFactory {
    /// Creates an anchor at `pose` on behalf of `trackable`.
    fn create_anchor(
        &mut self,
        trackable: &TrackableId,
        pose: Pose,
    ) -> Result<AnchorHandle, ProviderError>;

    /// Detaches an anchor and frees its provider resources. Unknown handles are ignored.
    fn release_anchor(&mut self, handle: AnchorHandle);
}

/// A live tracking session.
///
/// Methods are called from whichever thread holds the session cell, never
/// concurrently.
pub trait ArSession: AnchorFactory + Send {
    /// Starts or restarts camera capture.
    fn resume(&mut self) -> Result<(), ProviderError>;

    /// Stops camera capture and releases the camera.
    fn pause(&mut self);

    /// Applies the viewport geometry used for subsequent frames.
    fn set_display_geometry(&mut self, geometry: DisplayGeometry);

    /// Selects the texture the next update writes the camera image into.
    fn set_camera_texture(&mut self, texture: TextureHandle);

    /// Produces the latest frame. `Ok(None)` means no new camera image yet.
    fn update(&mut self) -> Result<Option<Frame>, ProviderError>;
}

/// Factory for sessions.
pub trait TrackingProvider: Send + Sync {
    /// Checks whether tracking can run. With `user_requested_install` the provider
    /// may start an install flow and report [`Availability::InstallRequested`].
    fn check_availability(&self, user_requested_install: bool) -> Availability;

    /// Creates and configures a paused session.
    fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn ArSession>, ProviderError>;
}
