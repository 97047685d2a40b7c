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

//! Render-side access to the session: one frame per tick, never blocking.

use crate::session_cell::{LifecycleState, SessionCell};
use lucent_core::{
    AnchorFactory, AnchorHandle, ArSession, Frame, FrameSequence, LucentError, LucentResult, Pose,
    ProviderError, TrackableId,
};
use std::sync::Arc;

/// Why a tick got no frame. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoFrameReason {
    /// The session is not `RUNNING`.
    NotRunning,
    /// A lifecycle transition holds the session right now.
    SessionBusy,
    /// The camera has not produced a new image since the last update.
    NoNewImage,
    /// The provider returned a frame already consumed.
    Stale,
}

/// Result of [`FrameSynchronizer::acquire_frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAcquisition {
    /// A frame newer than every frame consumed before.
    Frame(Frame),
    /// Nothing new this tick.
    NoFrame(NoFrameReason),
}

impl FrameAcquisition {
    /// The frame, if one was acquired.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::NoFrame(_) => None,
        }
    }

    /// True for any `NoFrame` outcome.
    pub fn is_no_frame(&self) -> bool {
        matches!(self, Self::NoFrame(_))
    }
}

/// Pulls frames from the session for the render thread.
///
/// Sequence numbers handed out are strictly increasing; a provider that hands
/// back an older or repeated frame gets [`NoFrameReason::Stale`].
pub struct FrameSynchronizer {
    cell: Arc<SessionCell>,
    last_sequence: Option<FrameSequence>,
}

impl FrameSynchronizer {
    pub(crate) fn new(cell: Arc<SessionCell>) -> Self {
        Self {
            cell,
            last_sequence: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn session_cell(&self) -> Arc<SessionCell> {
        Arc::clone(&self.cell)
    }

    /// Updates the session and returns the frame for this tick.
    ///
    /// Pending display geometry and the camera texture are applied right
    /// before the update. A fatal provider failure is returned as
    /// [`LucentError::FrameUnavailable`] and is not retried.
    pub fn acquire_frame(&mut self) -> LucentResult<FrameAcquisition> {
        let Some(mut guard) = self.cell.try_lock() else {
            log::trace!("Session busy, skipping tick.");
            return Ok(FrameAcquisition::NoFrame(NoFrameReason::SessionBusy));
        };
        let slot = &mut *guard;
        if slot.state != LifecycleState::Running {
            return Ok(FrameAcquisition::NoFrame(NoFrameReason::NotRunning));
        }
        let Some(session) = slot.session.as_mut() else {
            return Ok(FrameAcquisition::NoFrame(NoFrameReason::NotRunning));
        };

        if let Some(geometry) = self.cell.take_pending_geometry() {
            session.set_display_geometry(geometry);
        }
        session.set_camera_texture(slot.camera_texture);

        match session.update() {
            Ok(Some(frame)) => {
                let sequence = frame.sequence();
                if self.last_sequence.is_some_and(|last| sequence <= last) {
                    log::trace!("Frame {sequence} already consumed.");
                    return Ok(FrameAcquisition::NoFrame(NoFrameReason::Stale));
                }
                self.last_sequence = Some(sequence);
                log::trace!(
                    "Acquired frame {sequence} with {} trackable updates.",
                    frame.updated_trackables().len()
                );
                Ok(FrameAcquisition::Frame(frame))
            }
            Ok(None) => Ok(FrameAcquisition::NoFrame(NoFrameReason::NoNewImage)),
            Err(ProviderError::NotRunning) => {
                Ok(FrameAcquisition::NoFrame(NoFrameReason::NotRunning))
            }
            Err(e) => {
                log::error!("Session update failed: {e}");
                Err(LucentError::FrameUnavailable {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Runs `f` with the session's anchor factory.
    ///
    /// Returns `None` without calling `f` when no session exists or a lifecycle
    /// transition holds it.
    pub fn with_anchor_factory<R>(
        &mut self,
        f: impl FnOnce(&mut dyn AnchorFactory) -> R,
    ) -> Option<R> {
        let mut guard = self.cell.try_lock()?;
        let session = guard.session.as_mut()?;
        Some(f(&mut SessionAnchors(session.as_mut())))
    }

    /// Sequence number of the last frame handed out.
    pub fn last_sequence(&self) -> Option<FrameSequence> {
        self.last_sequence
    }
}

/// Lends a session's anchor side as a plain [`AnchorFactory`].
struct SessionAnchors<'a>(&'a mut dyn ArSession);

impl AnchorFactory for SessionAnchors<'_> {
    fn create_anchor(
        &mut self,
        trackable: &TrackableId,
        pose: Pose,
    ) -> Result<AnchorHandle, ProviderError> {
        self.0.create_anchor(trackable, pose)
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        self.0.release_anchor(handle);
    }
}
