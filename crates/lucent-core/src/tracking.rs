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

//! Vocabulary shared by the tracking service and the bookkeeping built on top of it.

use crate::math::Vec3;
use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stable identifier the service assigns to a detected image instance.
///
/// Cheap to clone; identifiers are compared and ordered by their text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TrackableId(Arc<str>);

impl TrackableId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackableId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TrackableId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<TrackableId> for String {
    fn from(value: TrackableId) -> Self {
        value.0.to_string()
    }
}

/// Tracking state of a single trackable.
///
/// `Paused` and `Tracking` may alternate; `Stopped` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingState {
    /// Detected but not currently tracked, pose is stale.
    Paused,
    /// Tracked this frame, pose is current.
    Tracking,
    /// Will never be tracked again.
    Stopped,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Paused => "PAUSED",
            Self::Tracking => "TRACKING",
            Self::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Why the camera is not tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingFailureReason {
    /// No failure reported.
    #[default]
    None,
    /// The session is in a bad internal state.
    BadState,
    /// Not enough light.
    InsufficientLight,
    /// The device moved too fast.
    ExcessiveMotion,
    /// Not enough texture in view.
    InsufficientFeatures,
    /// The camera is in use by another client.
    CameraUnavailable,
}

/// Tracking state of the camera itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraTrackingState {
    /// Camera pose is valid.
    Tracking,
    /// Tracking lost temporarily.
    Paused(TrackingFailureReason),
    /// Tracking stopped; the session needs to be resumed.
    Stopped,
}

impl CameraTrackingState {
    /// True only when the camera pose can be drawn against.
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking)
    }
}

/// Estimated physical size of a detected image, in metres.
///
/// Images lie in the local XZ plane of their center pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageExtent {
    /// Extent along local X.
    pub x: f32,
    /// Extent along local Z.
    pub z: f32,
}

impl ImageExtent {
    /// Creates an extent.
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Local offsets of the four corners from the center, in the order
    /// upper-left, upper-right, lower-right, lower-left.
    pub fn corner_offsets(&self) -> [Vec3; 4] {
        let hx = 0.5 * self.x;
        let hz = 0.5 * self.z;
        [
            Vec3::new(-hx, 0.0, -hz),
            Vec3::new(hx, 0.0, -hz),
            Vec3::new(hx, 0.0, hz),
            Vec3::new(-hx, 0.0, hz),
        ]
    }
}

/// One trackable as reported in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackableUpdate {
    /// Stable identifier.
    pub id: TrackableId,
    /// Index of the matched reference image in the database.
    pub image_index: i32,
    /// Name of the matched reference image, when the database carries names.
    pub name: Option<String>,
    /// Current tracking state.
    pub state: TrackingState,
    /// Estimated physical extent.
    pub extent: ImageExtent,
    /// Pose of the image center.
    pub center_pose: Pose,
}

impl TrackableUpdate {
    /// Creates an update with no reference-image name.
    pub fn new(
        id: impl Into<TrackableId>,
        image_index: i32,
        state: TrackingState,
        extent: ImageExtent,
        center_pose: Pose,
    ) -> Self {
        Self {
            id: id.into(),
            image_index,
            name: None,
            state,
            extent,
            center_pose,
        }
    }

    /// Attaches the reference-image name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
