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

use super::script::{lock, ScriptHandle, Step};
use lucent_core::{
    AnchorFactory, AnchorHandle, ArSession, DisplayGeometry, Frame, FrameSequence, Pose,
    ProviderError, SessionConfig, TextureHandle, TrackableId,
};

/// Nanoseconds between scripted frames, a 30 Hz camera.
const FRAME_INTERVAL_NS: i64 = 33_333_333;

pub(crate) struct ScriptedSession {
    script: ScriptHandle,
    geometry: DisplayGeometry,
    texture: TextureHandle,
    sequence: FrameSequence,
    last_frame: Option<Frame>,
}

impl ScriptedSession {
    pub(crate) fn new(script: ScriptHandle, config: &SessionConfig) -> Self {
        Self {
            script,
            geometry: config.display_geometry,
            texture: config.camera_texture,
            sequence: FrameSequence::default(),
            last_frame: None,
        }
    }
}

impl AnchorFactory for ScriptedSession {
    fn create_anchor(
        &mut self,
        trackable: &TrackableId,
        _pose: Pose,
    ) -> Result<AnchorHandle, ProviderError> {
        let mut state = lock(&self.script);
        if state.refuse_anchors {
            return Err(ProviderError::NotTracking);
        }
        state.next_anchor += 1;
        let handle = AnchorHandle(state.next_anchor);
        state.live_anchors.insert(handle, trackable.clone());
        state.stats.anchors_created += 1;
        Ok(handle)
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        let mut state = lock(&self.script);
        if state.live_anchors.remove(&handle).is_some() {
            state.stats.anchors_released += 1;
        }
    }
}

impl ArSession for ScriptedSession {
    fn resume(&mut self) -> Result<(), ProviderError> {
        let mut state = lock(&self.script);
        if let Some(err) = state.resume_errors.pop_front() {
            return Err(err);
        }
        state.running = true;
        state.stats.resume_calls += 1;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = lock(&self.script);
        state.running = false;
        state.stats.pause_calls += 1;
    }

    fn set_display_geometry(&mut self, geometry: DisplayGeometry) {
        self.geometry = geometry;
        lock(&self.script).stats.applied_geometries.push(geometry);
    }

    fn set_camera_texture(&mut self, texture: TextureHandle) {
        self.texture = texture;
        lock(&self.script).stats.camera_texture = Some(texture);
    }

    fn update(&mut self) -> Result<Option<Frame>, ProviderError> {
        let step = {
            let mut state = lock(&self.script);
            state.stats.update_calls += 1;
            if !state.running {
                return Err(ProviderError::NotRunning);
            }
            state.steps.pop_front()
        };

        match step {
            None | Some(Step::NoFrame) => Ok(None),
            Some(Step::Repeat) => Ok(self.last_frame.clone()),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Frame(spec)) => {
                let spec = *spec;
                self.sequence = self.sequence.next();
                let timestamp = self.sequence.0 as i64 * FRAME_INTERVAL_NS;
                let frame = Frame::new(
                    self.sequence,
                    timestamp,
                    spec.camera_pose,
                    spec.tracking_state,
                    spec.intrinsics,
                    self.geometry,
                    self.texture,
                )
                .with_light_estimate(spec.light_estimate)
                .with_trackables(spec.trackables);
                self.last_frame = Some(frame.clone());
                Ok(Some(frame))
            }
        }
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        let mut state = lock(&self.script);
        state.running = false;
        state.stats.sessions_dropped += 1;
    }
}
