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

//! The per-tick snapshot returned by a session update.

use crate::geometry::{CameraIntrinsics, DisplayGeometry};
use crate::math::LinearRgba;
use crate::pose::Pose;
use crate::tracking::{CameraTrackingState, TrackableUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic sequence number of a frame within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FrameSequence(pub u64);

impl FrameSequence {
    /// The sequence following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for FrameSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to the external texture the camera image is streamed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Ambient light estimate for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LightEstimate {
    /// The service had no usable estimate.
    #[default]
    Invalid,
    /// Per-channel color correction plus pixel intensity in `a`.
    Valid(LinearRgba),
}

impl LightEstimate {
    /// Color correction to apply, neutral white when the estimate is invalid.
    pub fn color_correction(&self) -> LinearRgba {
        match self {
            Self::Valid(c) => *c,
            Self::Invalid => LinearRgba::WHITE,
        }
    }
}

/// Immutable snapshot of the tracking service for one render tick.
///
/// A frame is consumed by exactly one tick and never retained afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    sequence: FrameSequence,
    timestamp_ns: i64,
    camera_pose: Pose,
    tracking_state: CameraTrackingState,
    intrinsics: CameraIntrinsics,
    geometry: DisplayGeometry,
    camera_texture: TextureHandle,
    light_estimate: LightEstimate,
    updated_trackables: Vec<TrackableUpdate>,
}

impl Frame {
    /// Creates a frame with no trackable updates and no light estimate.
    pub fn new(
        sequence: FrameSequence,
        timestamp_ns: i64,
        camera_pose: Pose,
        tracking_state: CameraTrackingState,
        intrinsics: CameraIntrinsics,
        geometry: DisplayGeometry,
        camera_texture: TextureHandle,
    ) -> Self {
        Self {
            sequence,
            timestamp_ns,
            camera_pose,
            tracking_state,
            intrinsics,
            geometry,
            camera_texture,
            light_estimate: LightEstimate::Invalid,
            updated_trackables: Vec::new(),
        }
    }

    /// Sets the trackables updated in this frame.
    pub fn with_trackables(mut self, updates: Vec<TrackableUpdate>) -> Self {
        self.updated_trackables = updates;
        self
    }

    /// Sets the light estimate.
    pub fn with_light_estimate(mut self, estimate: LightEstimate) -> Self {
        self.light_estimate = estimate;
        self
    }

    /// Sequence number within the session.
    pub fn sequence(&self) -> FrameSequence {
        self.sequence
    }

    /// Capture time of the camera image, in nanoseconds.
    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    /// Pose of the camera in world space.
    pub fn camera_pose(&self) -> Pose {
        self.camera_pose
    }

    /// Tracking state of the camera.
    pub fn tracking_state(&self) -> CameraTrackingState {
        self.tracking_state
    }

    /// Intrinsics of the camera image.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Display geometry the session had applied when producing this frame.
    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Texture the camera image was written to.
    pub fn camera_texture(&self) -> TextureHandle {
        self.camera_texture
    }

    /// Light estimate for this frame.
    pub fn light_estimate(&self) -> LightEstimate {
        self.light_estimate
    }

    /// Trackables whose state changed or were updated in this frame.
    pub fn updated_trackables(&self) -> &[TrackableUpdate] {
        &self.updated_trackables
    }

    /// Takes the trackable list out of the frame.
    pub fn take_trackables(&mut self) -> Vec<TrackableUpdate> {
        std::mem::take(&mut self.updated_trackables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{ImageExtent, TrackingState};

    fn frame() -> Frame {
        Frame::new(
            FrameSequence(3),
            1_000,
            Pose::IDENTITY,
            CameraTrackingState::Tracking,
            CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0, 640, 480),
            DisplayGeometry::default(),
            TextureHandle(7),
        )
    }

    #[test]
    fn test_invalid_light_estimate_is_neutral() {
        let f = frame();
        assert_eq!(f.light_estimate().color_correction(), LinearRgba::WHITE);
        let tinted = LinearRgba::new(0.9, 0.8, 0.7, 0.5);
        let f = f.with_light_estimate(LightEstimate::Valid(tinted));
        assert_eq!(f.light_estimate().color_correction(), tinted);
    }

    #[test]
    fn test_take_trackables_empties_the_list() {
        let update = TrackableUpdate::new(
            "img-1",
            0,
            TrackingState::Tracking,
            ImageExtent::new(0.2, 0.3),
            Pose::IDENTITY,
        );
        let mut f = frame().with_trackables(vec![update.clone()]);
        assert_eq!(f.updated_trackables(), &[update]);
        assert_eq!(f.take_trackables().len(), 1);
        assert!(f.updated_trackables().is_empty());
    }

    #[test]
    fn test_sequences_are_ordered() {
        assert!(FrameSequence(2) > FrameSequence(1));
        assert_eq!(FrameSequence(1).next(), FrameSequence(2));
        assert_eq!(FrameSequence(u64::MAX).next(), FrameSequence(u64::MAX));
    }
}
