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

use lucent_core::geometry::CameraIntrinsics;
use lucent_core::{
    AnchorHandle, Availability, CameraTrackingState, DisplayGeometry, LightEstimate, Pose,
    ProviderError, TextureHandle, TrackableId, TrackableUpdate,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Content of one scripted frame. Sequence, timestamp, geometry and texture are
/// filled in by the session when the frame is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    /// Camera pose.
    pub camera_pose: Pose,
    /// Camera tracking state.
    pub tracking_state: CameraTrackingState,
    /// Intrinsics in the device's natural orientation.
    pub intrinsics: CameraIntrinsics,
    /// Light estimate.
    pub light_estimate: LightEstimate,
    /// Trackables updated in this frame.
    pub trackables: Vec<TrackableUpdate>,
}

impl FrameSpec {
    /// A tracking frame at `camera_pose` with 640x480 intrinsics and no trackables.
    pub fn tracking(camera_pose: Pose) -> Self {
        Self {
            camera_pose,
            tracking_state: CameraTrackingState::Tracking,
            intrinsics: CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0, 640, 480),
            light_estimate: LightEstimate::Invalid,
            trackables: Vec::new(),
        }
    }

    /// Replaces the camera tracking state.
    pub fn with_tracking_state(mut self, state: CameraTrackingState) -> Self {
        self.tracking_state = state;
        self
    }

    /// Adds a trackable update.
    pub fn with_trackable(mut self, update: TrackableUpdate) -> Self {
        self.trackables.push(update);
        self
    }

    /// Sets the light estimate.
    pub fn with_light_estimate(mut self, estimate: LightEstimate) -> Self {
        self.light_estimate = estimate;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Frame(Box<FrameSpec>),
    NoFrame,
    Repeat,
    Fail(ProviderError),
}

/// Calls the runtime made against the scripted provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptStats {
    /// `check_availability` calls.
    pub availability_checks: usize,
    /// Sessions created.
    pub sessions_created: usize,
    /// Sessions dropped.
    pub sessions_dropped: usize,
    /// Successful `resume` calls.
    pub resume_calls: usize,
    /// `pause` calls.
    pub pause_calls: usize,
    /// `update` calls.
    pub update_calls: usize,
    /// Every geometry applied, at creation and through `set_display_geometry`.
    pub applied_geometries: Vec<DisplayGeometry>,
    /// Last camera texture set.
    pub camera_texture: Option<TextureHandle>,
    /// Image count of the configured database, when known.
    pub configured_images: Option<usize>,
    /// Anchors created.
    pub anchors_created: usize,
    /// Anchors released.
    pub anchors_released: usize,
}

#[derive(Debug)]
pub(crate) struct ScriptState {
    pub(crate) availability: Availability,
    pub(crate) create_error: Option<ProviderError>,
    pub(crate) resume_errors: VecDeque<ProviderError>,
    pub(crate) steps: VecDeque<Step>,
    pub(crate) refuse_anchors: bool,
    pub(crate) running: bool,
    pub(crate) next_anchor: u64,
    pub(crate) live_anchors: BTreeMap<AnchorHandle, TrackableId>,
    pub(crate) stats: ScriptStats,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            availability: Availability::Supported,
            create_error: None,
            resume_errors: VecDeque::new(),
            steps: VecDeque::new(),
            refuse_anchors: false,
            running: false,
            next_anchor: 0,
            live_anchors: BTreeMap::new(),
            stats: ScriptStats::default(),
        }
    }
}

/// Shared control surface of a [`super::ScriptedProvider`].
#[derive(Debug, Clone, Default)]
pub struct ScriptHandle {
    pub(crate) state: Arc<Mutex<ScriptState>>,
}

pub(crate) fn lock(handle: &ScriptHandle) -> MutexGuard<'_, ScriptState> {
    handle.state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptHandle {
    /// Queues a frame.
    pub fn push_frame(&self, frame: FrameSpec) {
        lock(self).steps.push_back(Step::Frame(Box::new(frame)));
    }

    /// Queues an update that finds no new camera image.
    pub fn push_no_frame(&self) {
        lock(self).steps.push_back(Step::NoFrame);
    }

    /// Queues an update that returns the previous frame again, same sequence number.
    pub fn push_repeat(&self) {
        lock(self).steps.push_back(Step::Repeat);
    }

    /// Queues an update that fails.
    pub fn push_failure(&self, error: ProviderError) {
        lock(self).steps.push_back(Step::Fail(error));
    }

    /// Makes the next `resume` fail with `error`. Calls queue up.
    pub fn fail_next_resume(&self, error: ProviderError) {
        lock(self).resume_errors.push_back(error);
    }

    /// Makes the next `create_session` fail.
    pub fn fail_session_creation(&self, error: ProviderError) {
        lock(self).create_error = Some(error);
    }

    /// Sets what `check_availability` reports.
    pub fn set_availability(&self, availability: Availability) {
        lock(self).availability = availability;
    }

    /// Refuses every anchor creation while set.
    pub fn refuse_anchors(&self, refuse: bool) {
        lock(self).refuse_anchors = refuse;
    }

    /// Frames and failures not consumed yet.
    pub fn pending_steps(&self) -> usize {
        lock(self).steps.len()
    }

    /// Whether a session is currently capturing.
    pub fn is_running(&self) -> bool {
        lock(self).running
    }

    /// Anchors created and not yet released.
    pub fn live_anchors(&self) -> Vec<(AnchorHandle, TrackableId)> {
        lock(self)
            .live_anchors
            .iter()
            .map(|(h, id)| (*h, id.clone()))
            .collect()
    }

    /// Copy of the call statistics.
    pub fn stats(&self) -> ScriptStats {
        lock(self).stats.clone()
    }
}
